//! Embedded level layouts
//!
//! One character per cell, one line per row:
//!
//! | char | tile | brick  |
//! |------|------|--------|
//! | `.`  | 0    | empty  |
//! | `g`  | 3    | glass  |
//! | `#`  | 5    | plain  |
//! | `d`  | 10   | double |
//! | `b`  | 12   | bomb   |
//!
//! Anything else loads as an empty cell.

use rand::Rng;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    #[error("no level {index} (only {count} levels are embedded)")]
    Missing { index: usize, count: usize },
}

const LEVELS: [&str; 13] = [
    // 0: wall
    "\
...............
...............
.#############.
.#############.
.#############.
.#############.
.#############.
...............",
    // 1: glass roof
    "\
ggggggggggggggg
...............
.#.#.#.#.#.#.#.
#.#.#.#.#.#.#.#
.#.#.#.#.#.#.#.
#.#.#.#.#.#.#.#",
    // 2: pyramid
    "\
.......#.......
......###......
.....#####.....
....###d###....
...#########...
..###########..
.#############.",
    // 3: powder keg
    "\
...............
.#####...#####.
.##b##...##b##.
.#####...#####.
...............
....#######....
....###b###....
....#######....",
    // 4: columns
    "\
#.#.#.#.#.#.#.#
#.#.#.#.#.#.#.#
#.#.#.#.#.#.#.#
#.#.#.#.#.#.#.#
#.#.#.#.#.#.#.#
d.#.#.#.#.#.#.d",
    // 5: diamond
    "\
.......#.......
......###......
.....##g##.....
....##ggg##....
...##ggbgg##...
....##ggg##....
.....##g##.....
......###......
.......#.......",
    // 6: frame
    "\
###############
#.............#
#.ddd.....ddd.#
#.............#
#.....bbb.....#
#.............#
###############",
    // 7: stairs
    "\
#..............
##.............
###............
####...........
#####..........
######.........
#######........
########.......
#########......
##########.....",
    // 8: checkers
    "\
#.#.#.#.#.#.#.#
.g.g.g.g.g.g.g.
#.#.#.#.#.#.#.#
.g.g.g.g.g.g.g.
#.#.#.#.#.#.#.#
.g.g.g.g.g.g.g.",
    // 9: invader
    "\
...............
...#.......#...
....#.....#....
...#########...
..##.#####.##..
.#############.
.#.#########.#.
.#.#.......#.#.
....##...##....",
    // 10: chain
    "\
...............
.b.b.b.b.b.b.b.
.#############.
...............
.b.b.b.b.b.b.b.
.#############.",
    // 11: glasshouse
    "\
ggggggggggggggg
g.............g
g.###########.g
g.#ddddddddd#.g
g.###########.g
g.............g
ggggggggggggggg",
    // 12: rain
    "\
#......#......#
.#.....#.....#.
..#....#....#..
...#...d...#...
....#..#..#....
.....#.#.#.....
......###......",
];

pub fn count() -> usize {
    LEVELS.len()
}

/// Layout text of level `index`
pub fn layout(index: usize) -> Result<&'static str, LevelError> {
    LEVELS.get(index).copied().ok_or(LevelError::Missing {
        index,
        count: LEVELS.len(),
    })
}

pub fn random_index(rng: &mut impl Rng) -> usize {
    rng.random_range(0..LEVELS.len())
}

/// Tile code of a layout character
pub fn tile_of(c: char) -> u8 {
    match c {
        'g' => 3,
        '#' => 5,
        'd' => 10,
        'b' => 12,
        _ => 0,
    }
}

/// Parse layout text into a `rows × cols` tile matrix
///
/// Short or missing rows are padded with empty tiles; anything past the grid
/// is dropped.
pub fn tiles_from_text(text: &str, rows: usize, cols: usize) -> Vec<Vec<u8>> {
    let mut tiles = vec![vec![0; cols]; rows];
    for (row, line) in text.lines().take(rows).enumerate() {
        for (col, c) in line.chars().take(cols).enumerate() {
            tiles[row][col] = tile_of(c);
        }
    }
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_every_level_fits_the_grid() {
        for index in 0..count() {
            let text = layout(index).unwrap();
            assert!(text.lines().count() <= 15, "level {index} too tall");
            for line in text.lines() {
                assert_eq!(line.chars().count(), 15, "level {index}: `{line}`");
            }
            let tiles = tiles_from_text(text, 15, 15);
            let bricks = tiles.iter().flatten().filter(|&&t| t != 0).count();
            assert!(bricks >= 3, "level {index} would end immediately");
        }
    }

    #[test]
    fn test_missing_level_is_an_error() {
        assert_eq!(
            layout(99),
            Err(LevelError::Missing {
                index: 99,
                count: LEVELS.len()
            })
        );
    }

    #[test]
    fn test_unknown_characters_are_empty() {
        let tiles = tiles_from_text("#?g\nxb", 3, 3);
        assert_eq!(tiles, vec![vec![5, 0, 3], vec![0, 12, 0], vec![0, 0, 0]]);
    }

    #[test]
    fn test_oversized_text_is_truncated() {
        let tiles = tiles_from_text("#####\n#####\n#####", 2, 3);
        assert_eq!(tiles, vec![vec![5; 3]; 2]);
    }

    #[test]
    fn test_random_index_in_range() {
        let mut rng = Pcg32::seed_from_u64(0);
        for _ in 0..100 {
            assert!(random_index(&mut rng) < count());
        }
    }
}
