//! Rank assignment over scored rows
//!
//! Percentile ranks, dense ranks, tiles and lags are computed here as explicit
//! sorting passes rather than in SQL, so the store needs no window-function
//! support. All orderings are descending by value with ascending id as the
//! tie-break, which keeps every report deterministic for equal values.

/// One row with every rank this module assigns
///
/// `rank` follows SQL RANK (1-based, gaps after ties), `dense_rank` follows
/// DENSE_RANK (no gaps), and `percent_rank` is `(rank - 1) / (n - 1)`, defined
/// as 0 for a single row. Rows with equal values share all three.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedRow {
    /// Row identifier, unique within one ranking
    pub id: i64,
    /// The value the ranking is over
    pub value: f64,
    /// 1-based rank with gaps after ties
    pub rank: u64,
    /// 1-based rank without gaps
    pub dense_rank: u64,
    /// Rank scaled to [0, 1]
    pub percent_rank: f64,
}

/// Rank rows by value descending, ids ascending within ties
#[must_use]
pub fn rank_desc(rows: &[(i64, f64)]) -> Vec<RankedRow> {
    let mut sorted: Vec<(i64, f64)> = rows.to_vec();
    sorted.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let n = sorted.len();
    let mut ranked = Vec::with_capacity(n);
    let mut rank = 0u64;
    let mut dense_rank = 0u64;
    let mut previous_value: Option<f64> = None;

    for (position, (id, value)) in sorted.into_iter().enumerate() {
        if previous_value != Some(value) {
            rank = position as u64 + 1;
            dense_rank += 1;
            previous_value = Some(value);
        }
        let percent_rank = if n <= 1 {
            0.0
        } else {
            (rank - 1) as f64 / (n - 1) as f64
        };
        ranked.push(RankedRow {
            id,
            value,
            rank,
            dense_rank,
            percent_rank,
        });
    }

    ranked
}

/// Tile numbers for `count` pre-sorted rows split into `tiles` groups
///
/// Matches SQL NTILE: group sizes differ by at most one and the earlier
/// groups take the remainder. Returns an empty vector when either argument
/// is zero; the result is indexed by sorted position and 1-based.
#[must_use]
pub fn ntile(count: usize, tiles: usize) -> Vec<u64> {
    if count == 0 || tiles == 0 {
        return Vec::new();
    }

    let base = count / tiles;
    let remainder = count % tiles;
    let mut assignments = Vec::with_capacity(count);

    for tile in 0..tiles {
        let size = base + usize::from(tile < remainder);
        for _ in 0..size {
            assignments.push(tile as u64 + 1);
        }
    }

    assignments
}

/// The previous element for every position, None for the first
#[must_use]
pub fn lag<T: Clone>(items: &[T]) -> Vec<Option<T>> {
    let mut lagged = Vec::with_capacity(items.len());
    let mut previous: Option<T> = None;
    for item in items {
        lagged.push(previous.replace(item.clone()));
    }
    lagged
}
