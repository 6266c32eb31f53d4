#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusState {
    Idle,
    Focused(usize),
}

/// Cursor over a list laid out as a fixed-column grid.
///
/// Focus is `Idle` exactly when the list is empty; otherwise the index always
/// stays inside `0..len`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridNav {
    len: usize,
    columns: usize,
    state: FocusState,
}

impl GridNav {
    pub fn new(columns: usize) -> Self {
        Self {
            len: 0,
            columns: columns.max(1),
            state: FocusState::Idle,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn set_columns(&mut self, columns: usize) {
        self.columns = columns.max(1);
    }

    pub fn state(&self) -> FocusState {
        self.state
    }

    pub fn focused(&self) -> Option<usize> {
        match self.state {
            FocusState::Idle => None,
            FocusState::Focused(index) => Some(index),
        }
    }

    pub fn rows(&self) -> usize {
        self.len.div_ceil(self.columns)
    }

    pub fn row_of(&self, index: usize) -> usize {
        index / self.columns
    }

    pub fn focused_row(&self) -> Option<usize> {
        self.focused().map(|index| self.row_of(index))
    }

    /// Resizes the list, keeping the current index when it is still in range.
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        self.state = match (len, self.state) {
            (0, _) => FocusState::Idle,
            (_, FocusState::Idle) => FocusState::Focused(0),
            (_, FocusState::Focused(index)) => FocusState::Focused(index.min(len - 1)),
        };
    }

    /// Focuses `index`, clamped to the last item. Returns whether focus moved.
    pub fn focus(&mut self, index: usize) -> bool {
        if self.len == 0 {
            return false;
        }
        let next = FocusState::Focused(index.min(self.len - 1));
        let changed = next != self.state;
        self.state = next;
        changed
    }

    /// Moves by one item horizontally or one row vertically, saturating at the ends.
    pub fn move_focus(&mut self, direction: Direction) -> bool {
        let Some(current) = self.focused() else {
            return false;
        };
        let last = self.len - 1;
        let next = match direction {
            Direction::Left => current.saturating_sub(1),
            Direction::Right => current.saturating_add(1).min(last),
            Direction::Up => current.saturating_sub(self.columns),
            Direction::Down => current.saturating_add(self.columns).min(last),
        };
        self.focus(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn nav(len: usize, columns: usize) -> GridNav {
        let mut nav = GridNav::new(columns);
        nav.set_len(len);
        nav
    }

    #[test]
    fn empty_grid_is_idle() {
        let mut nav = nav(0, 4);
        assert_eq!(nav.state(), FocusState::Idle);
        assert!(!nav.move_focus(Direction::Right));
        assert!(!nav.focus(3));
        assert_eq!(nav.focused(), None);
    }

    #[test]
    fn ends_do_not_wrap() {
        let mut nav = nav(5, 8);
        assert!(!nav.move_focus(Direction::Left));
        assert_eq!(nav.focused(), Some(0));
        nav.focus(4);
        assert!(!nav.move_focus(Direction::Right));
        assert_eq!(nav.focused(), Some(4));
    }

    #[test]
    fn single_item_ignores_moves() {
        let mut nav = nav(1, 3);
        for direction in [
            Direction::Left,
            Direction::Right,
            Direction::Up,
            Direction::Down,
        ] {
            assert!(!nav.move_focus(direction));
            assert_eq!(nav.focused(), Some(0));
        }
    }

    #[test]
    fn vertical_moves_jump_a_row_and_clamp() {
        let mut nav = nav(10, 4);
        nav.move_focus(Direction::Down);
        assert_eq!(nav.focused(), Some(4));
        nav.move_focus(Direction::Right);
        nav.move_focus(Direction::Down);
        assert_eq!(nav.focused(), Some(9));
        nav.move_focus(Direction::Up);
        nav.move_focus(Direction::Up);
        nav.move_focus(Direction::Up);
        assert_eq!(nav.focused(), Some(0));
        assert_eq!(nav.rows(), 3);
    }

    #[test]
    fn shrinking_clamps_focus() {
        let mut nav = nav(10, 4);
        nav.focus(9);
        nav.set_len(3);
        assert_eq!(nav.focused(), Some(2));
        nav.set_len(0);
        assert_eq!(nav.state(), FocusState::Idle);
        nav.set_len(2);
        assert_eq!(nav.focused(), Some(0));
    }

    fn direction() -> impl Strategy<Value = Direction> {
        prop_oneof![
            Just(Direction::Left),
            Just(Direction::Right),
            Just(Direction::Up),
            Just(Direction::Down),
        ]
    }

    proptest! {
        #[test]
        fn focus_stays_in_bounds(
            len in 1usize..200,
            columns in 1usize..13,
            moves in proptest::collection::vec(direction(), 0..100),
        ) {
            let mut nav = nav(len, columns);
            for direction in moves {
                nav.move_focus(direction);
                let focused = nav.focused();
                prop_assert!(matches!(focused, Some(index) if index < len));
            }
        }

        #[test]
        fn resizing_never_leaves_focus_out_of_range(
            sizes in proptest::collection::vec(0usize..50, 1..20),
            target in 0usize..100,
        ) {
            let mut nav = nav(1, 4);
            for len in sizes {
                nav.focus(target);
                nav.set_len(len);
                match nav.focused() {
                    None => prop_assert_eq!(len, 0),
                    Some(index) => prop_assert!(index < len),
                }
            }
        }
    }
}
