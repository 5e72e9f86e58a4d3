use ndarray::Array2;

/// Pixel neighbourhood used for adjacency.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Connectivity {
    /// Edge neighbours only (up, down, left, right).
    #[default]
    Four,
    /// Edge and corner neighbours (full 3x3 square).
    Eight,
}

impl Connectivity {
    pub fn offsets(self) -> &'static [(isize, isize)] {
        match self {
            Self::Four => &[(-1, 0), (0, -1), (0, 1), (1, 0)],
            Self::Eight => &[
                (-1, -1),
                (-1, 0),
                (-1, 1),
                (0, -1),
                (0, 1),
                (1, -1),
                (1, 0),
                (1, 1),
            ],
        }
    }
}

/// True pixels with no true neighbour under `connectivity`.
///
/// Out-of-bounds neighbours count as false.
pub fn isolated_pixels(mask: &Array2<bool>, connectivity: Connectivity) -> Array2<bool> {
    let (h, w) = mask.dim();
    let mut result = Array2::from_elem((h, w), false);

    for row in 0..h {
        for col in 0..w {
            if !mask[[row, col]] {
                continue;
            }
            let has_neighbour = connectivity.offsets().iter().any(|&(dr, dc)| {
                let nr = row as isize + dr;
                let nc = col as isize + dc;
                nr >= 0
                    && nr < h as isize
                    && nc >= 0
                    && nc < w as isize
                    && mask[[nr as usize, nc as usize]]
            });
            result[[row, col]] = !has_neighbour;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_isolated_pixels_ignores_pairs() {
        let mask = array![
            [true, false, false, false],
            [false, false, false, false],
            [false, false, true, false],
            [false, false, false, true],
        ];
        let eight = isolated_pixels(&mask, Connectivity::Eight);
        assert!(eight[[0, 0]]);
        assert!(!eight[[2, 2]]);
        assert!(!eight[[3, 3]]);

        // The diagonal pair is only adjacent through a corner.
        let four = isolated_pixels(&mask, Connectivity::Four);
        assert!(four[[2, 2]]);
        assert!(four[[3, 3]]);
    }
}
