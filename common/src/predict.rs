use crate::board::{Board, Input};

/// Client input ids start above this; server-side echoes of id 0 never match
/// a real delta.
const INPUT_ID_BASE: u64 = 4000;

/// Client-side prediction/reconciliation buffer.
///
/// Holds the last server-authoritative snapshot (base state) plus the ordered
/// list of locally-applied, not-yet-acknowledged inputs (deltas). The
/// presented state is the fold of the deltas over the base, cached until
/// either side changes.
#[derive(Debug)]
pub struct PredictionBuffer {
    base: Board,
    deltas: Vec<(u64, Input)>,
    next_input_id: u64,
    cache: Option<Board>,
}

impl PredictionBuffer {
    pub fn new(base: Board) -> Self {
        Self {
            base,
            deltas: Vec::new(),
            next_input_id: INPUT_ID_BASE,
            cache: None,
        }
    }

    /// Record a local input and return its freshly assigned, strictly
    /// increasing id. The caller wraps the id with room/player metadata and
    /// sends it to the server.
    pub fn add_input(&mut self, input: Input) -> u64 {
        self.next_input_id += 1;
        let input_id = self.next_input_id;
        self.deltas.push((input_id, input));
        self.cache = None;
        input_id
    }

    /// Drop every delta with id ≤ `input_id`: the server has incorporated
    /// them into the snapshots it sends from now on.
    pub fn ack_until(&mut self, input_id: u64) {
        self.deltas.retain(|(id, _)| *id > input_id);
        self.cache = None;
    }

    /// Replace the base snapshot.
    ///
    /// Deltas are kept: a snapshot can arrive because of another player's
    /// input, before our own inputs are acknowledged, and clearing here would
    /// silently drop them. A kept delta may briefly replay over a conflicting
    /// base; that resolves itself on the next ack or base update.
    pub fn set_base_state(&mut self, base: Board) {
        self.base = base;
        self.cache = None;
    }

    /// The state to present: base with all pending deltas applied in id order.
    pub fn current_state(&mut self) -> Board {
        if let Some(board) = &self.cache {
            return board.clone();
        }

        let mut state = self.base.clone();
        for (_, input) in &self.deltas {
            state = state.apply(input);
        }
        self.cache = Some(state.clone());
        state
    }

    pub fn pending_inputs(&self) -> usize {
        self.deltas.len()
    }
}
