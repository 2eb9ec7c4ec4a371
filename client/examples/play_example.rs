use minerace_client::{CellState, ClientGame, GameClient, GameEvent, RoomCreationParameters};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt::init();

    let (client, events) = GameClient::connect("localhost:7849").await?;
    let player_id = client.login("play_example").await?;

    let room_id = client
        .create_game(&RoomCreationParameters {
            name: "solo demo".into(),
            field_size_x: 8,
            field_size_y: 8,
            mine_prob: 10.0,
            max_players: 2,
        })
        .await?;

    let mut game = ClientGame::join(client, events, player_id, room_id).await?;
    println!(
        "Joined room {} as seat {}",
        game.room_id(),
        game.player_index()
    );

    let mut clicked = false;
    while let Some(event) = game.next_event().await {
        match event {
            GameEvent::BoardUpdated => {
                let Some(board) = game.board() else { continue };
                print_board(&board);
                println!("scores: {:?}", game.scores());

                if !clicked {
                    // Open the first cell of our starting territory.
                    let input_id = game.click(0, 0, 1)?;
                    println!("clicked (0, 0), input id {}", input_id);
                    clicked = true;
                }
            }
            GameEvent::RoomParamsChanged { room_id } => {
                let params = game.client().fetch_room_params(room_id).await?;
                if !params.game_active {
                    println!("game over: {}", params.popup_message);
                    break;
                }
            }
        }
    }

    game.leave().await;
    Ok(())
}

fn print_board(board: &minerace_client::Board) {
    for y in 0..board.height() {
        for x in 0..board.width() {
            let Some(cell) = board.cell(x, y) else { continue };
            let glyph = match cell.state {
                CellState::Locked => '#',
                CellState::Clickable => '.',
                CellState::Flagged => 'F',
                CellState::Clicked if cell.is_mine => '*',
                CellState::Clicked => char::from_digit(cell.number as u32, 10).unwrap_or('?'),
            };
            print!("{} ", glyph);
        }
        println!();
    }
}
