mod common;

use common::{Event, SimBus, SimChip, MHZ};
use rp2_psram::bus::DirectTx;
use rp2_psram::config::DIRECT_CLKDIV;
use rp2_psram::psram::{self, Opcode};
use rp2_psram::Capacity;

#[test]
fn absent_chip_is_absent_every_time() {
    let mut bus = SimBus::empty();
    assert_eq!(psram::detect(&mut bus), Capacity::Absent);
    assert_eq!(psram::detect(&mut bus), Capacity::Absent);
}

#[test]
fn present_chip_reads_the_same_twice() {
    let mut bus = SimBus::with_8mib_chip();
    assert_eq!(psram::detect(&mut bus), Capacity::Mib8);
    assert_eq!(psram::detect(&mut bus), Capacity::Mib8);
}

#[test]
fn density_codes_from_the_wire() {
    for (eid, expected) in [
        (0b000_01010, Capacity::Mib2),
        (0b001_01010, Capacity::Mib4),
        (0b010_01010, Capacity::Mib8),
        (0x26, Capacity::Mib8),
        (0b110_00000, Capacity::Unrecognized(0xc0)),
    ] {
        let mut bus = SimBus::new(150 * MHZ, Some(SimChip::new(0x5d, eid)));
        assert_eq!(psram::detect(&mut bus), expected, "eid {:#x}", eid);
    }
}

#[test]
fn bad_die_marker_is_absent() {
    let mut bus = SimBus::new(150 * MHZ, Some(SimChip::new(0x55, 0x46)));
    assert_eq!(psram::detect(&mut bus), Capacity::Absent);
}

#[test]
fn quad_exit_then_read_id_windows() {
    let mut bus = SimBus::with_8mib_chip();
    psram::detect(&mut bus);

    let nop = Opcode::Nop as u8;
    assert_eq!(
        bus.transactions(),
        vec![
            vec![Opcode::ExitQuadMode as u8],
            vec![Opcode::ReadId as u8, nop, nop, nop, nop, nop, nop],
        ]
    );

    let exit = bus
        .events
        .iter()
        .find_map(|e| match e {
            Event::Transaction(window) => Some(window[0]),
            _ => None,
        })
        .unwrap();
    assert_eq!(exit, DirectTx::quad(Opcode::ExitQuadMode as u8));
}

#[test]
fn chip_left_in_quad_mode_is_still_found() {
    let mut chip = SimChip::new(0x5d, 0x46);
    chip.quad = true;
    let mut bus = SimBus::new(150 * MHZ, Some(chip));

    assert_eq!(psram::detect(&mut bus), Capacity::Mib8);
    assert!(!bus.chip().quad);
}

#[test]
fn direct_mode_is_entered_slowly_and_left_off() {
    for mut bus in [SimBus::empty(), SimBus::with_8mib_chip()] {
        psram::detect(&mut bus);

        assert_eq!(bus.events[1], Event::DirectEnabled(DIRECT_CLKDIV));
        assert_eq!(bus.count(&Event::DirectDisabled), 1);
        assert!(!bus.direct_enabled);
        assert!(!bus.cs1_asserted);
        assert_eq!(bus.timing, None);
        assert!(!bus.writable);
    }
}

#[test]
fn detection_runs_under_the_interrupt_mask() {
    let mut bus = SimBus::with_8mib_chip();
    psram::detect(&mut bus);

    assert_eq!(bus.events.first(), Some(&Event::MaskAcquired));
    assert_eq!(bus.events.last(), Some(&Event::MaskReleased));
    assert_eq!(bus.count(&Event::MaskAcquired), 1);
    assert_eq!(bus.count(&Event::MaskReleased), 1);
    assert_eq!(bus.unmasked_transfers, 0);
    assert!(!bus.mask_held);
}

#[test]
fn read_id_leaves_direct_mode_before_returning() {
    let mut bus = SimBus::with_8mib_chip();
    let id = psram::read_id(&mut bus);

    assert!(id.known_good_die());
    assert!(!bus.direct_enabled);
    assert_eq!(bus.events.len(), 4);
    assert_eq!(bus.events[0], Event::DirectEnabled(DIRECT_CLKDIV));
    assert_eq!(bus.events[3], Event::DirectDisabled);
}
