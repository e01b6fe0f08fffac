//! Page budget across the four parts of the book

/// Smallest book the part floors can accommodate
pub const MIN_TARGET_PAGES: u32 = 100;

/// Part titles used in the page budget, in order
pub const PART_TITLES: [&str; 4] = [
    "I. Концепт и бриф",
    "II. Архитектура",
    "III. Качество и продакшн",
    "IV. Кейсы и чек-листы",
];

const SHARES: [f64; 3] = [0.18, 0.38, 0.32];
const FLOORS: [u32; 4] = [20, 40, 30, 10];

/// Order in which parts give up pages when the last part is below its floor
const DONORS: [usize; 3] = [1, 2, 0];

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn share(target: u32, index: usize) -> u32 {
    let pages = (f64::from(target) * SHARES[index]).round_ties_even();
    (pages.max(0.0) as u32).max(FLOORS[index])
}

/// Split `target` pages over four parts.
///
/// Parts I-III take a fixed share (rounded half-to-even) with a floor each; part IV
/// gets the remainder. When the remainder is below its floor, pages are moved from
/// parts II, III and I (never below their floors). For `target >= MIN_TARGET_PAGES`
/// the parts always sum to `target`; smaller targets leave part IV short.
#[must_use]
pub fn page_budget(target: u32) -> [u32; 4] {
    let mut parts = [share(target, 0), share(target, 1), share(target, 2), 0];
    let head = |parts: &[u32; 4]| parts[..3].iter().map(|p| i64::from(*p)).sum::<i64>();

    let mut deficit = i64::from(FLOORS[3]) - (i64::from(target) - head(&parts));
    for donor in DONORS {
        if deficit <= 0 {
            break;
        }
        let spare = parts[donor] - FLOORS[donor];
        let take = u32::try_from(deficit).map_or(spare, |d| d.min(spare));
        parts[donor] -= take;
        deficit -= i64::from(take);
    }

    parts[3] = u32::try_from((i64::from(target) - head(&parts)).max(0)).unwrap_or(0);
    parts
}
