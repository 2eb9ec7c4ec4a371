use minerace_client::{GameClient, RoomCreationParameters};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt::init();

    let (client, _events) = GameClient::connect("localhost:7849").await?;

    let player_id = client.login("lobby_example").await?;
    println!("Logged in as player {}", player_id);

    let room_id = client
        .create_game(&RoomCreationParameters {
            name: "example room".into(),
            field_size_x: 10,
            field_size_y: 10,
            mine_prob: 5.0,
            max_players: 2,
        })
        .await?;
    println!("Created room {}", room_id);

    for room in client.fetch_game_list().await? {
        println!(
            "room {}: {} ({}) {}/{} players, joinable: {}",
            room.room_id,
            room.name,
            room.parameters,
            room.current_players,
            room.max_players,
            room.joinable
        );
    }

    client.disconnect().await;
    Ok(())
}
