use crate::game::board::{Board, Letter};

/// The four axes a three-cell line can lie on, as (row, col) steps.
const AXES: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// Counts the S-O-S lines completed by writing `letter` at `(row, col)`.
///
/// Must be called right after the letter lands and before any other cell
/// changes. Each line is counted once per (axis, direction); only one letter
/// is placed per turn, so a physical line can never be seen twice.
pub fn count_new_lines(board: &Board, row: usize, col: usize, letter: Letter) -> u32 {
    let (row, col) = (row as isize, col as isize);
    let mut count = 0;

    match letter {
        // Placed the middle of a line: both distance-1 neighbors on the
        // axis must be 'S'. At most one line per axis.
        Letter::O => {
            for (dr, dc) in AXES {
                if board.letter_at(row - dr, col - dc) == Some(Letter::S)
                    && board.letter_at(row + dr, col + dc) == Some(Letter::S)
                {
                    count += 1;
                }
            }
        }
        // Placed an end of a line: walk each direction looking for an
        // adjacent 'O' backed by an 'S'. At most two lines per axis.
        Letter::S => {
            for (dr, dc) in AXES {
                for (dr, dc) in [(dr, dc), (-dr, -dc)] {
                    if board.letter_at(row + dr, col + dc) == Some(Letter::O)
                        && board.letter_at(row + 2 * dr, col + 2 * dc) == Some(Letter::S)
                    {
                        count += 1;
                    }
                }
            }
        }
    }

    count
}
