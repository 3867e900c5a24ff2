//! Geometric detection of scripts whose canvas rectangles collide.

use sb3::{Script, Target};

/// Unordered pairs of distinct scripts in one target whose placement
/// rectangles intersect. Quadratic in script count, which stays in the
/// tens for real projects.
pub fn find_overlaps(target: &Target) -> Vec<(&Script, &Script)> {
    let mut pairs = Vec::new();
    for (i, first) in target.scripts.iter().enumerate() {
        for second in &target.scripts[i + 1..] {
            if first.rect.intersects(&second.rect) {
                pairs.push((first, second));
            }
        }
    }
    pairs
}
