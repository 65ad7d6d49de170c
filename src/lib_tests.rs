use super::{db_to_lin, perform_frequency_modulation};
use crate::math::abs;

fn close(a: f64, b: f64) -> bool {
    abs(a - b) < 1e-9
}

#[test]
fn db_to_lin_works() {
    assert!(close(db_to_lin(-25f64), 0.056_234_132_519_034_91));
    assert!(close(db_to_lin(-20f64), 0.1));
    assert!(close(db_to_lin(-15f64), 0.177_827_941_003_892_3));
    assert!(close(db_to_lin(-10f64), 0.316_227_766_016_837_94));
    assert!(close(db_to_lin(-5f64), 0.562_341_325_190_349_1));
    assert_eq!(db_to_lin(0f64), 1.0);
}

#[test]
fn db_to_lin_floor() {
    assert_eq!(db_to_lin(-99f64), 0.0);
    assert_eq!(db_to_lin(-1000f64), 0.0);
    assert_eq!(db_to_lin(f64::NEG_INFINITY), 0.0);
    assert_eq!(db_to_lin(f64::NAN), 0.0);
    assert!(db_to_lin(-98.9) > 0.0);
}

#[test]
fn perform_frequency_modulation_works() {
    assert!(close(perform_frequency_modulation(247.0, 0.25, 661.447_625_604_258_3), 247.868_359_794_984_9));
    assert!(close(perform_frequency_modulation(247.0, 0.25, 661.451_661_885_437_4), 247.531_772_995_473_26));
    assert!(close(perform_frequency_modulation(247.0, 0.25, 661.455_698_166_616_6), 247.123_861_876_648_3));
    assert!(close(perform_frequency_modulation(247.0, 0.25, 661.459_734_447_795_7), 246.686_257_309_660_08));
    assert!(close(perform_frequency_modulation(247.0, 0.25, 661.463_793_404_711_9), 246.260_265_733_164_5));
}

#[test]
fn no_flutter_keeps_f0() {
    assert_eq!(perform_frequency_modulation(120.0, 0.0, 0.37), 120.0);
}
