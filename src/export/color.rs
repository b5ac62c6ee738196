/// Alpha channel for KML polygon fills (0..255, 200 is lightly translucent).
const KML_FILL_ALPHA: u8 = 200;

/// Map a probability to a KML fill color in AABBGGRR hex order.
///
/// Three bands: below 0.3 the fill ramps from red toward yellow, between
/// 0.3 and 0.7 from yellow toward green, and from 0.7 up it is pure green.
/// Google Earth expects the ABGR byte order, not the usual RGBA.
pub(crate) fn probability_to_kml_color(probability: f64) -> String {
    let p = if probability.is_finite() { probability.clamp(0.0, 1.0) } else { 0.0 };

    let (red, green) = if p < 0.3 {
        (255, (p / 0.3 * 255.0) as u8)
    } else if p < 0.7 {
        ((255.0 - (p - 0.3) / 0.4 * 255.0) as u8, 255)
    } else {
        (0, 255)
    };
    format!("{:02x}{:02x}{:02x}{:02x}", KML_FILL_ALPHA, 0, green, red)
}

/// RdYlGn gradient stops for on-screen region colors.
const SCREEN_STOPS: [(u8, u8, u8); 5] = [
    (215, 48, 39),
    (252, 141, 89),
    (254, 224, 139),
    (145, 207, 96),
    (26, 152, 80),
];

/// Map a score to a `#rrggbb` screen color on a red-yellow-green gradient.
///
/// This mapping is for the web UI sidecars and is deliberately not the same
/// as the KML one; the two consumers evolved different palettes.
pub(crate) fn score_to_screen_color(score: f64) -> String {
    let s = if score.is_finite() { score.clamp(0.0, 1.0) } else { 0.0 };

    let scaled = s * (SCREEN_STOPS.len() - 1) as f64;
    let lower = (scaled.floor() as usize).min(SCREEN_STOPS.len() - 2);
    let t = scaled - lower as f64;

    let (r0, g0, b0) = SCREEN_STOPS[lower];
    let (r1, g1, b1) = SCREEN_STOPS[lower + 1];
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    format!("#{:02x}{:02x}{:02x}", lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channels(abgr: &str) -> (u8, u8, u8, u8) {
        let byte = |i: usize| u8::from_str_radix(&abgr[i..i + 2], 16).unwrap();
        (byte(0), byte(2), byte(4), byte(6))
    }

    #[test]
    fn kml_color_band_endpoints() {
        assert_eq!(probability_to_kml_color(0.0), "c80000ff");
        assert_eq!(probability_to_kml_color(1.0), "c800ff00");
        assert_eq!(probability_to_kml_color(0.7), "c800ff00");

        // mid band is yellow-ish: both channels high
        let (_, _, g, r) = channels(&probability_to_kml_color(0.3));
        assert_eq!((r, g), (255, 255));
    }

    #[test]
    fn kml_green_rises_and_red_falls_with_probability() {
        let mut last_green = 0u8;
        let mut last_red = 255u8;
        for step in 0..=100 {
            let (a, b, g, r) = channels(&probability_to_kml_color(step as f64 / 100.0));
            assert_eq!(a, KML_FILL_ALPHA);
            assert_eq!(b, 0);
            assert!(g >= last_green, "green regressed at p={}", step as f64 / 100.0);
            assert!(r <= last_red, "red regressed at p={}", step as f64 / 100.0);
            last_green = g;
            last_red = r;
        }
    }

    #[test]
    fn kml_color_handles_out_of_range_input() {
        assert_eq!(probability_to_kml_color(f64::NAN), probability_to_kml_color(0.0));
        assert_eq!(probability_to_kml_color(-2.0), probability_to_kml_color(0.0));
        assert_eq!(probability_to_kml_color(7.5), probability_to_kml_color(1.0));
    }

    #[test]
    fn screen_gradient_hits_its_stops() {
        assert_eq!(score_to_screen_color(0.0), "#d73027");
        assert_eq!(score_to_screen_color(0.5), "#fee08b");
        assert_eq!(score_to_screen_color(1.0), "#1a9850");
    }
}
