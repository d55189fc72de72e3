//! Completion tracking over a plan's topics.

/// Percentage of `true` flags, `0.0` when there are none.
pub fn completion_percentage<I>(completed_flags: I) -> f64
where
    I: IntoIterator<Item = bool>,
{
    let (done, total) = completed_flags
        .into_iter()
        .fold((0u32, 0u32), |(done, total), completed| {
            (done + u32::from(completed), total + 1)
        });

    if total == 0 {
        0.0
    } else {
        f64::from(done) / f64::from(total) * 100.0
    }
}
