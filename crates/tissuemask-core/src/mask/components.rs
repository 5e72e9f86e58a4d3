use ndarray::Array2;

use super::morphology::Connectivity;

/// Statistics for a single connected component.
#[derive(Clone, Debug)]
pub struct ComponentStats {
    /// Label of this component in the returned label image.
    pub label: u32,
    /// Number of pixels in the component.
    pub area: usize,
    /// Bounding box: (min_row, max_row, min_col, max_col).
    pub bbox: (usize, usize, usize, usize),
}

/// Connected components of `mask` as a label image plus per-component stats.
#[derive(Clone, Debug)]
pub struct Labeling {
    /// 0 for pixels outside the mask, otherwise the component label.
    pub labels: Array2<u32>,
    /// Stats indexed by `label - 1`.
    pub components: Vec<ComponentStats>,
}

impl Labeling {
    pub fn component(&self, label: u32) -> Option<&ComponentStats> {
        label
            .checked_sub(1)
            .and_then(|i| self.components.get(i as usize))
    }
}

/// Label the `true` pixels of `mask` with two-pass union-find.
///
/// Labels are consecutive from 1 in raster order of each component's first
/// pixel.
pub fn label_components(mask: &Array2<bool>, connectivity: Connectivity) -> Labeling {
    let (h, w) = mask.dim();
    let mut labels = Array2::<u32>::zeros((h, w));
    if h == 0 || w == 0 {
        return Labeling {
            labels,
            components: Vec::new(),
        };
    }

    // Neighbours already visited in raster order.
    let backward: &[(isize, isize)] = match connectivity {
        Connectivity::Four => &[(-1, 0), (0, -1)],
        Connectivity::Eight => &[(-1, -1), (-1, 0), (-1, 1), (0, -1)],
    };

    let mut next_label: u32 = 1;
    // Union-find parent array. Index 0 unused; labels start at 1.
    let mut parent: Vec<u32> = vec![0];

    // Pass 1: assign provisional labels.
    for row in 0..h {
        for col in 0..w {
            if !mask[[row, col]] {
                continue;
            }

            let mut current = 0u32;
            for &(dr, dc) in backward {
                let nr = row as isize + dr;
                let nc = col as isize + dc;
                if nr < 0 || nc < 0 || nc >= w as isize {
                    continue;
                }
                let neighbour = labels[[nr as usize, nc as usize]];
                if neighbour == 0 {
                    continue;
                }
                if current == 0 {
                    current = neighbour;
                } else if current != neighbour {
                    union(&mut parent, current, neighbour);
                    current = current.min(neighbour);
                }
            }

            if current == 0 {
                parent.push(next_label);
                current = next_label;
                next_label += 1;
            }
            labels[[row, col]] = current;
        }
    }

    // Flatten parent references and renumber roots consecutively.
    let mut final_label = vec![0u32; next_label as usize];
    let mut components: Vec<ComponentStats> = Vec::new();
    for i in 1..next_label as usize {
        let root = find(&parent, i as u32) as usize;
        if final_label[root] == 0 {
            components.push(ComponentStats {
                label: components.len() as u32 + 1,
                area: 0,
                bbox: (usize::MAX, 0, usize::MAX, 0),
            });
            final_label[root] = components.len() as u32;
        }
        final_label[i] = final_label[root];
    }

    // Pass 2: resolve labels and collect stats.
    for row in 0..h {
        for col in 0..w {
            let provisional = labels[[row, col]];
            if provisional == 0 {
                continue;
            }
            let lbl = final_label[provisional as usize];
            labels[[row, col]] = lbl;

            let entry = &mut components[lbl as usize - 1];
            entry.area += 1;
            entry.bbox.0 = entry.bbox.0.min(row);
            entry.bbox.1 = entry.bbox.1.max(row);
            entry.bbox.2 = entry.bbox.2.min(col);
            entry.bbox.3 = entry.bbox.3.max(col);
        }
    }

    Labeling { labels, components }
}

/// Returns true if the component's bounding box touches any edge of the image.
pub fn touches_border(bbox: (usize, usize, usize, usize), height: usize, width: usize) -> bool {
    let (min_row, max_row, min_col, max_col) = bbox;
    min_row == 0 || max_row + 1 >= height || min_col == 0 || max_col + 1 >= width
}

fn find(parent: &[u32], mut x: u32) -> u32 {
    while parent[x as usize] != x {
        x = parent[x as usize];
    }
    x
}

fn union(parent: &mut [u32], a: u32, b: u32) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        // Merge larger root into smaller root to keep labels consistent.
        let (small, big) = if ra < rb { (ra, rb) } else { (rb, ra) };
        parent[big as usize] = small;
    }
}
