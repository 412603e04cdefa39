//! Integer range helpers shared by the LED backends.

/// Clamp `v` to `[lo, hi]`.
pub fn clamp(v: i32, lo: i32, hi: i32) -> i32 {
    if v < lo {
        lo
    } else if v < hi {
        v
    } else {
        hi
    }
}

/// Linearly translate `v` from `[l1, h1]` into `[l2, h2]`.
///
/// Rounds to the nearest step and clamps the result to the output range.
/// Integer division truncates toward zero, so inputs far below `l1` still
/// land on `l2` via the clamp.
///
/// Intermediate math is done in `i64` and saturates, so any `i32` input is
/// accepted.
pub fn trans(v: i32, l1: i32, h1: i32, l2: i32, h2: i32) -> i32 {
    let (v, l1, h1, l2w, h2w) = (
        i64::from(v),
        i64::from(l1),
        i64::from(h1),
        i64::from(l2),
        i64::from(h2),
    );
    let d1 = h1 - l1;
    let d2 = h2w - l2w;
    if d1 == 0 {
        return l2;
    }
    let step = d2.saturating_mul(v - l1).saturating_add(d1 / 2) / d1;
    let out = l2w.saturating_add(step);

    // Result is l2, h2 or strictly between them, so it fits an i32.
    if out < l2w {
        l2
    } else if out < h2w {
        out as i32
    } else {
        h2
    }
}

/// Scale a 0..255 intensity into `0..=max`.
///
/// Zero / non-zero nature of the input is preserved: anything `<= 0` maps to
/// 0, anything positive maps into `[1, max]`.
pub fn scale_value(v: i32, max: i32) -> i32 {
    if v <= 0 {
        0
    } else {
        trans(v, 1, 255, 1, max)
    }
}
