use std::collections::{HashMap, VecDeque};

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const NEIGHBOR_DELTAS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Score awarded to the owner of a clicked, numbered cell.
const SCORE_SAFE_CLICK: i32 = 10;
/// Score awarded to the owner of a clicked mine.
const SCORE_MINE_CLICK: i32 = -200;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("board payload truncated: {0} bytes is shorter than the 4-byte dimension header")]
    Truncated(usize),
    #[error("{actual} cell bytes in a {width}x{height} board, expected {expected}")]
    LengthMismatch {
        width: u16,
        height: u16,
        expected: usize,
        actual: usize,
    },
    #[error("cell number {0} out of range 0..=8")]
    NumberOutOfRange(u8),
}

/// Lifecycle of a single cell.
///
/// `owner` on the [`Cell`] is meaningful only for the last three states; a
/// locked cell always has owner 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    Locked,
    Clickable,
    Clicked,
    Flagged,
}

impl CellState {
    const fn code(self) -> u8 {
        match self {
            Self::Locked => 0,
            Self::Clickable => 1,
            Self::Clicked => 2,
            Self::Flagged => 3,
        }
    }

    const fn from_code(code: u8) -> Self {
        match code & 3 {
            0 => Self::Locked,
            1 => Self::Clickable,
            2 => Self::Clicked,
            _ => Self::Flagged,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub state: CellState,
    pub owner: u8,
    pub is_mine: bool,
    pub number: u8,
}

impl Cell {
    pub const fn locked(is_mine: bool, number: u8) -> Self {
        Self {
            state: CellState::Locked,
            owner: 0,
            is_mine,
            number,
        }
    }

    /// A cell accepts a click only while it is clickable territory of that
    /// exact player.
    pub fn can_click_by(self, player_index: u8) -> bool {
        self.state == CellState::Clickable && self.owner == player_index
    }

    pub const fn with_state(self, state: CellState) -> Self {
        Self { state, ..self }
    }

    pub const fn with_owner(self, owner: u8) -> Self {
        Self { owner, ..self }
    }

    /// Contribution of this cell to its owner's score, if any.
    fn score(self) -> Option<(u8, i32)> {
        if self.state != CellState::Clicked {
            return None;
        }
        if self.is_mine {
            Some((self.owner, SCORE_MINE_CLICK))
        } else if self.number == 0 {
            None
        } else {
            Some((self.owner, SCORE_SAFE_CLICK))
        }
    }

    /// byte 1: bits 0-1 state, bits 2-4 owner, bit 5 is_mine.
    /// byte 2: bits 0-3 number.
    fn to_bytes(self) -> [u8; 2] {
        let mut byte1 = self.state.code();
        byte1 |= (self.owner & 7) << 2;
        byte1 |= (self.is_mine as u8) << 5;
        [byte1, self.number & 15]
    }

    fn from_bytes(bytes: [u8; 2]) -> Result<Self, BoardError> {
        let number = bytes[1] & 15;
        if number > 8 {
            return Err(BoardError::NumberOutOfRange(number));
        }
        Ok(Self {
            state: CellState::from_code(bytes[0]),
            owner: (bytes[0] >> 2) & 7,
            is_mine: (bytes[0] >> 5) & 1 != 0,
            number,
        })
    }
}

/// Number of players a board is generated for. Starting territory layout is
/// fixed per count and must match on client and server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Players {
    Two,
    Four,
}

impl Players {
    pub const fn count(self) -> u8 {
        match self {
            Self::Two => 2,
            Self::Four => 4,
        }
    }

    pub const fn from_count(count: u8) -> Option<Self> {
        match count {
            2 => Some(Self::Two),
            4 => Some(Self::Four),
            _ => None,
        }
    }
}

/// One player action against a board position.
///
/// button 1 = uncover, 2 = flag, 3 = chord. Anything else is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    pub x: u16,
    pub y: u16,
    pub button: u8,
    pub player_index: u8,
}

/// An immutable minefield snapshot.
///
/// Every state-changing operation returns a fresh `Board`; an instance is
/// never mutated after construction. Derived snapshots come from
/// [`Board::apply`], initial ones from the generators or [`Board::from_bytes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl Board {
    pub fn from_cells(width: u16, height: u16, cells: Vec<Cell>) -> Result<Self, BoardError> {
        let expected = width as usize * height as usize;
        if cells.len() != expected {
            return Err(BoardError::LengthMismatch {
                width,
                height,
                expected: expected * 2,
                actual: cells.len() * 2,
            });
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Roll every cell independently as a mine with probability `mine_prob`.
    ///
    /// Note the rolls are independent: a 100-cell board at 5% may well end up
    /// with far more (or fewer) than 5 mines.
    pub fn generate_random(width: u16, height: u16, mine_prob: f64, players: Players) -> Self {
        let mut rng = rand::rng();
        let mines: Vec<bool> = (0..width as usize * height as usize)
            .map(|_| rng.random::<f64>() < mine_prob)
            .collect();
        Self::from_mine_map(width, height, &mines, players)
    }

    /// Like [`Board::generate_random`], but mine placement is mirrored
    /// point-symmetrically about the board center, so both halves are equally
    /// hard. This is what makes 2-player matches fair.
    pub fn generate_symmetric(width: u16, height: u16, mine_prob: f64, players: Players) -> Self {
        let w = width as usize;
        let h = height as usize;
        let mut rng = rand::rng();
        let mut mines = vec![false; w * h];

        for index in 0..mines.len() {
            let (x, y) = (index % w, index / w);
            let reflected = (h - 1 - y) * w + (w - 1 - x);
            if reflected < index {
                mines[index] = mines[reflected];
            } else {
                mines[index] = rng.random::<f64>() < mine_prob;
            }
        }

        Self::from_mine_map(width, height, &mines, players)
    }

    /// Build a fresh board from an explicit mine map (row-major, one bool per
    /// cell), compute adjacency numbers, lock everything and open the starting
    /// territory for `players`.
    pub fn from_mine_map(width: u16, height: u16, mines: &[bool], players: Players) -> Self {
        assert_eq!(mines.len(), width as usize * height as usize);

        let mut cells: Vec<Cell> = mines
            .iter()
            .enumerate()
            .map(|(index, &mine)| Cell::locked(mine, count_adjacent_mines(mines, index, width, height)))
            .collect();

        open_starting_territory(&mut cells, width, height, players);

        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn cell(&self, x: u16, y: u16) -> Option<Cell> {
        if x < self.width && y < self.height {
            Some(self.cells[self.index(x, y)])
        } else {
            None
        }
    }

    fn index(&self, x: u16, y: u16) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Apply one input and return the resulting snapshot. Out-of-bounds
    /// targets, unknown buttons and clicks the player is not entitled to all
    /// return an unchanged copy.
    pub fn apply(&self, input: &Input) -> Self {
        let mut cells = self.cells.clone();

        if input.x < self.width && input.y < self.height {
            let at = (input.x, input.y);
            match input.button {
                1 => uncover(&mut cells, self.width, self.height, at, input.player_index),
                2 => flag(&mut cells, self.width, self.height, at, input.player_index),
                3 => chord(&mut cells, self.width, self.height, at, input.player_index),
                _ => {}
            }
        }

        Self {
            width: self.width,
            height: self.height,
            cells,
        }
    }

    /// Per-player score totals. Players without any scoring cell are absent
    /// from the map.
    pub fn scores(&self) -> HashMap<u8, i32> {
        let mut scores = HashMap::new();
        for cell in &self.cells {
            if let Some((owner, points)) = cell.score() {
                *scores.entry(owner).or_insert(0) += points;
            }
        }
        scores
    }

    /// True once every non-mine cell that is unowned or owned by a player in
    /// `player_filter` has been clicked.
    ///
    /// Every cell is always visited, with no early exit, so a call costs the
    /// same no matter how full the board is.
    pub fn all_opened(&self, player_filter: &[u8]) -> bool {
        let mut all_open = true;
        for cell in &self.cells {
            if (player_filter.contains(&cell.owner) || cell.owner == 0)
                && !cell.is_mine
                && cell.state != CellState::Clicked
            {
                all_open = false;
            }
        }
        all_open
    }

    /// Bit-exact wire format: width u16 BE, height u16 BE, then 2 bytes per
    /// cell in row-major order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.cells.len() * 2);
        out.extend_from_slice(&self.width.to_be_bytes());
        out.extend_from_slice(&self.height.to_be_bytes());
        for cell in &self.cells {
            out.extend_from_slice(&cell.to_bytes());
        }
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BoardError> {
        if bytes.len() < 4 {
            return Err(BoardError::Truncated(bytes.len()));
        }

        let width = u16::from_be_bytes([bytes[0], bytes[1]]);
        let height = u16::from_be_bytes([bytes[2], bytes[3]]);
        let expected = width as usize * height as usize * 2;
        let cell_bytes = &bytes[4..];
        if cell_bytes.len() != expected {
            return Err(BoardError::LengthMismatch {
                width,
                height,
                expected,
                actual: cell_bytes.len(),
            });
        }

        let cells = cell_bytes
            .chunks_exact(2)
            .map(|pair| Cell::from_bytes([pair[0], pair[1]]))
            .collect::<Result<Vec<Cell>, BoardError>>()?;

        Ok(Self {
            width,
            height,
            cells,
        })
    }
}

fn count_adjacent_mines(mines: &[bool], index: usize, width: u16, height: u16) -> u8 {
    let w = width as i32;
    let h = height as i32;
    let x = (index % width as usize) as i32;
    let y = (index / width as usize) as i32;
    let mut count = 0;

    for (dx, dy) in NEIGHBOR_DELTAS {
        let nx = x + dx;
        let ny = y + dy;
        if nx >= 0 && nx < w && ny >= 0 && ny < h && mines[(ny * w + nx) as usize] {
            count += 1;
        }
    }

    count
}

fn neighbors(x: u16, y: u16, width: u16, height: u16) -> Vec<(u16, u16)> {
    let mut out = Vec::with_capacity(8);
    for (dx, dy) in NEIGHBOR_DELTAS {
        let nx = x as i32 + dx;
        let ny = y as i32 + dy;
        if nx >= 0 && nx < width as i32 && ny >= 0 && ny < height as i32 {
            out.push((nx as u16, ny as u16));
        }
    }
    out
}

fn open_starting_territory(cells: &mut [Cell], width: u16, height: u16, players: Players) {
    let w = width as usize;
    let h = height as usize;
    // A degenerate board has no edges to open.
    if w == 0 || h == 0 {
        return;
    }
    let mut open = |x: usize, y: usize, owner: u8| {
        let cell = cells[y * w + x];
        cells[y * w + x] = cell.with_state(CellState::Clickable).with_owner(owner);
    };

    match players {
        Players::Two => {
            for y in 0..h {
                open(0, y, 1);
                open(w - 1, y, 2);
            }
        }
        Players::Four => {
            // Edge order matters at the corners: left, right, top, bottom.
            for y in 0..h {
                open(0, y, 1);
                open(w - 1, y, 4);
            }
            for x in 1..w {
                open(x, 0, 2);
            }
            for x in 0..w - 1 {
                open(x, h - 1, 3);
            }
        }
    }
}

/// Iterative flood fill. Uncovers the starting cell if the player may click
/// it, spreads territory to locked neighbors, and keeps expanding through
/// zero-number non-mine cells. A coordinate already waiting in the queue is
/// never enqueued again.
fn uncover(cells: &mut [Cell], width: u16, height: u16, start: (u16, u16), player_index: u8) {
    let mut queue: VecDeque<(u16, u16)> = VecDeque::new();
    queue.push_back(start);

    while let Some((x, y)) = queue.pop_front() {
        let index = y as usize * width as usize + x as usize;
        let cell = cells[index];
        if !cell.can_click_by(player_index) {
            continue;
        }

        cells[index] = cell
            .with_state(CellState::Clicked)
            .with_owner(player_index);

        // A mine never auto-expands, whatever its number says.
        let auto_expand = cell.number == 0 && !cell.is_mine;

        for (nx, ny) in neighbors(x, y, width, height) {
            let neighbor_index = ny as usize * width as usize + nx as usize;
            if cells[neighbor_index].state == CellState::Locked {
                cells[neighbor_index] = cells[neighbor_index]
                    .with_state(CellState::Clickable)
                    .with_owner(player_index);
            }

            if queue.contains(&(nx, ny)) {
                continue;
            }
            if auto_expand {
                queue.push_back((nx, ny));
            }
        }
    }
}

/// Flag toggle: a player's own flag reverts to clickable; otherwise a
/// clickable owned cell becomes flagged. Everything else is untouched.
fn flag(cells: &mut [Cell], width: u16, _height: u16, at: (u16, u16), player_index: u8) {
    let index = at.1 as usize * width as usize + at.0 as usize;
    let cell = cells[index];

    if cell.state == CellState::Flagged {
        if cell.owner == player_index {
            cells[index] = cell.with_state(CellState::Clickable);
        }
    } else if cell.can_click_by(player_index) {
        cells[index] = cell.with_state(CellState::Flagged);
    }
}

/// Chord: when the flagged-or-clicked-mine neighbor count equals the center
/// cell's number exactly, uncover every neighbor on the player's behalf.
fn chord(cells: &mut [Cell], width: u16, height: u16, center: (u16, u16), player_index: u8) {
    let around = neighbors(center.0, center.1, width, height);

    let mut accounted = 0;
    for &(x, y) in &around {
        let cell = cells[y as usize * width as usize + x as usize];
        if cell.state == CellState::Flagged || (cell.state == CellState::Clicked && cell.is_mine) {
            accounted += 1;
        }
    }

    let center_cell = cells[center.1 as usize * width as usize + center.0 as usize];
    if accounted != center_cell.number as usize {
        return;
    }

    for &at in &around {
        uncover(cells, width, height, at, player_index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_board(width: u16, height: u16, owner: u8, mines: &[(u16, u16)]) -> Board {
        // Every cell clickable by `owner`, numbers derived from the mine list.
        let mine_map: Vec<bool> = (0..height)
            .flat_map(|y| (0..width).map(move |x| mines.contains(&(x, y))))
            .collect();
        let cells: Vec<Cell> = mine_map
            .iter()
            .enumerate()
            .map(|(index, &mine)| Cell {
                state: CellState::Clickable,
                owner,
                is_mine: mine,
                number: count_adjacent_mines(&mine_map, index, width, height),
            })
            .collect();
        Board::from_cells(width, height, cells).unwrap()
    }

    fn click(board: &Board, x: u16, y: u16, button: u8, player_index: u8) -> Board {
        board.apply(&Input {
            x,
            y,
            button,
            player_index,
        })
    }

    #[test]
    fn two_player_territory() {
        let board = Board::from_mine_map(5, 4, &[false; 20], Players::Two);

        for y in 0..4 {
            assert!(board.cell(0, y).unwrap().can_click_by(1));
            assert!(board.cell(4, y).unwrap().can_click_by(2));
        }
        let middle = board.cell(2, 1).unwrap();
        assert_eq!(middle.state, CellState::Locked);
        assert_eq!(middle.owner, 0);
    }

    #[test]
    fn four_player_territory_corners() {
        let board = Board::from_mine_map(6, 5, &[false; 30], Players::Four);

        // Left edge beats top/bottom at x=0, top beats right at the corner.
        assert_eq!(board.cell(0, 0).unwrap().owner, 1);
        assert_eq!(board.cell(5, 0).unwrap().owner, 2);
        assert_eq!(board.cell(0, 4).unwrap().owner, 3);
        assert_eq!(board.cell(5, 4).unwrap().owner, 4);
        assert_eq!(board.cell(3, 0).unwrap().owner, 2);
        assert_eq!(board.cell(3, 4).unwrap().owner, 3);
        assert_eq!(board.cell(0, 2).unwrap().owner, 1);
        assert_eq!(board.cell(5, 2).unwrap().owner, 4);
    }

    #[test]
    fn degenerate_dimensions_produce_an_empty_board() {
        let board = Board::from_mine_map(0, 5, &[], Players::Two);
        assert_eq!(board.width(), 0);
        assert!(board.cell(0, 0).is_none());

        let board = Board::from_mine_map(5, 0, &[], Players::Four);
        assert_eq!(board.height(), 0);
        assert!(board.all_opened(&[1, 2, 3, 4]));
    }

    #[test]
    fn adjacency_numbers() {
        let board = Board::from_mine_map(
            3,
            3,
            &[
                true, false, false, //
                false, false, false, //
                false, false, true,
            ],
            Players::Two,
        );

        assert_eq!(board.cell(1, 1).unwrap().number, 2);
        assert_eq!(board.cell(1, 0).unwrap().number, 1);
        assert_eq!(board.cell(2, 2).unwrap().number, 0);
        assert!(board.cell(2, 2).unwrap().is_mine);
    }

    #[test]
    fn flood_fill_opens_whole_empty_board() {
        let board = open_board(5, 5, 1, &[]);
        let after = click(&board, 4, 4, 1, 1);

        for y in 0..5 {
            for x in 0..5 {
                assert_eq!(after.cell(x, y).unwrap().state, CellState::Clicked);
                assert_eq!(after.cell(x, y).unwrap().owner, 1);
            }
        }
    }

    #[test]
    fn uncover_spreads_territory_into_locked_neighbors() {
        let mut board = Board::from_mine_map(5, 5, &[false; 25], Players::Two);
        board = click(&board, 0, 2, 1, 1);

        // Flood fill ran over the whole left column and claimed everything it
        // touched for player 1.
        assert_eq!(board.cell(1, 2).unwrap().owner, 1);
        assert_ne!(board.cell(1, 2).unwrap().state, CellState::Locked);
    }

    #[test]
    fn uncover_requires_ownership() {
        let board = Board::from_mine_map(5, 5, &[false; 25], Players::Two);
        let after = click(&board, 0, 2, 1, 2);

        assert_eq!(after, board);
    }

    #[test]
    fn mine_click_does_not_expand() {
        let board = open_board(3, 3, 1, &[(1, 1)]);
        let after = click(&board, 1, 1, 1, 1);

        assert_eq!(after.cell(1, 1).unwrap().state, CellState::Clicked);
        // Neighbors stay unclicked: mines never flood.
        assert_eq!(after.cell(0, 0).unwrap().state, CellState::Clickable);
        assert_eq!(after.cell(2, 2).unwrap().state, CellState::Clickable);
    }

    #[test]
    fn flag_toggles_for_owner_only() {
        let board = open_board(3, 3, 1, &[]);

        let flagged = click(&board, 1, 1, 2, 1);
        assert_eq!(flagged.cell(1, 1).unwrap().state, CellState::Flagged);
        assert_eq!(flagged.cell(1, 1).unwrap().owner, 1);

        // Someone else cannot remove the flag.
        let still_flagged = click(&flagged, 1, 1, 2, 2);
        assert_eq!(still_flagged.cell(1, 1).unwrap().state, CellState::Flagged);

        let unflagged = click(&flagged, 1, 1, 2, 1);
        assert_eq!(unflagged.cell(1, 1).unwrap().state, CellState::Clickable);
    }

    #[test]
    fn chord_uncovers_when_count_matches() {
        // One mine at (0,0); (1,1) has number 1.
        let board = open_board(3, 3, 1, &[(0, 0)]);
        let flagged = click(&board, 0, 0, 2, 1);

        let after = click(&flagged, 1, 1, 3, 1);
        assert_eq!(after.cell(1, 0).unwrap().state, CellState::Clicked);
        assert_eq!(after.cell(0, 1).unwrap().state, CellState::Clicked);
        assert_eq!(after.cell(2, 2).unwrap().state, CellState::Clicked);
        assert_eq!(after.cell(0, 0).unwrap().state, CellState::Flagged);
    }

    #[test]
    fn chord_with_wrong_count_is_a_noop() {
        // Two mines adjacent to (1,1), only one flagged.
        let board = open_board(3, 3, 1, &[(0, 0), (2, 0)]);
        let flagged = click(&board, 0, 0, 2, 1);

        let after = click(&flagged, 1, 1, 3, 1);
        assert_eq!(after, flagged);
    }

    #[test]
    fn score_counts_only_numbered_clicks() {
        // Single mine at (0,0); clicking (4,4) floods over every zero cell
        // and clicks the numbered ring around the mine.
        let board = open_board(5, 5, 1, &[(0, 0)]);
        let after = click(&board, 4, 4, 1, 1);

        // (1,0), (0,1), (1,1) carry number 1; everything else is 0 or the mine.
        assert_eq!(after.scores(), HashMap::from([(1, 30)]));

        let mine_hit = click(&after, 0, 0, 1, 1);
        assert_eq!(mine_hit.scores(), HashMap::from([(1, 30 + SCORE_MINE_CLICK)]));
    }

    #[test]
    fn single_numbered_click_scores_ten() {
        let board = open_board(5, 5, 1, &[(0, 0)]);
        let after = click(&board, 1, 1, 1, 1);

        assert_eq!(after.scores(), HashMap::from([(1, 10)]));
    }

    #[test]
    fn all_opened_ignores_other_players_territory() {
        let board = open_board(3, 3, 1, &[(0, 0)]);
        assert!(!board.all_opened(&[1]));

        let after = click(&board, 2, 2, 1, 1);
        // Everything except the mine is clicked now.
        assert!(after.all_opened(&[1]));
        assert!(after.all_opened(&[1, 2]));
    }

    #[test]
    fn all_opened_counts_unowned_cells() {
        let board = Board::from_mine_map(3, 3, &[false; 9], Players::Two);
        // Locked center cells are unowned and unclicked.
        assert!(!board.all_opened(&[1, 2]));
    }

    #[test]
    fn serialization_roundtrip_is_bit_exact() {
        let board = open_board(4, 3, 2, &[(1, 1), (3, 0)]);
        let after = click(&board, 0, 2, 1, 2);

        let bytes = after.to_bytes();
        assert_eq!(bytes.len(), 4 + 4 * 3 * 2);
        let restored = Board::from_bytes(&bytes).unwrap();
        assert_eq!(restored, after);
        assert_eq!(restored.to_bytes(), bytes);
    }

    #[test]
    fn deserialization_rejects_wrong_length() {
        let board = Board::from_mine_map(3, 3, &[false; 9], Players::Two);
        let mut bytes = board.to_bytes();
        bytes.pop();

        assert!(matches!(
            Board::from_bytes(&bytes),
            Err(BoardError::LengthMismatch { .. })
        ));
        assert!(matches!(Board::from_bytes(&bytes[..3]), Err(BoardError::Truncated(3))));
    }

    #[test]
    fn replicas_converge_to_identical_bytes() {
        let mines = [
            false, true, false, false, //
            false, false, false, true, //
            true, false, false, false,
        ];
        let inputs = [
            Input { x: 0, y: 0, button: 1, player_index: 1 },
            Input { x: 3, y: 2, button: 1, player_index: 2 },
            Input { x: 0, y: 2, button: 2, player_index: 1 },
            Input { x: 1, y: 1, button: 3, player_index: 1 },
        ];

        let mut a = Board::from_mine_map(4, 3, &mines, Players::Two);
        let mut b = Board::from_mine_map(4, 3, &mines, Players::Two);
        for input in &inputs {
            a = a.apply(input);
            b = b.apply(input);
        }

        assert_eq!(a.to_bytes(), b.to_bytes());
    }

    #[test]
    fn symmetric_generation_mirrors_mines() {
        let board = Board::generate_symmetric(9, 7, 0.4, Players::Two);
        for y in 0..7u16 {
            for x in 0..9u16 {
                let mirrored = board.cell(8 - x, 6 - y).unwrap();
                assert_eq!(board.cell(x, y).unwrap().is_mine, mirrored.is_mine);
            }
        }
    }
}
