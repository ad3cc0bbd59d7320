use super::*;

#[test]
fn test_flash_expires_after_duration() {
    let t0 = Instant::now();
    let mut flash = Flash::new();
    assert!(!flash.is_on());

    flash.start(Segment::new(0, 4), false, t0);
    assert!(flash.is_on());
    assert!(flash.iterate(t0 + Duration::from_millis(100)));
    assert!(flash.intensity() > 0.0 && flash.intensity() < 1.0);

    assert!(!flash.iterate(t0 + FLASH_DURATION));
    assert!(!flash.is_on());
    assert_eq!(flash.intensity(), 0.0);
}

#[test]
fn test_restart_resets_clock() {
    let t0 = Instant::now();
    let mut flash = Flash::new();
    flash.start(Segment::new(0, 1), true, t0);

    let t1 = t0 + Duration::from_millis(400);
    flash.start(Segment::new(2, 3), false, t1);
    assert!(flash.iterate(t0 + Duration::from_millis(600)));
    assert!(!flash.is_line());
    assert_eq!(flash.segment(), Some(Segment::new(2, 3)));
}
