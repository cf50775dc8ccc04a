//! Init sequence driver and reset/recovery against the scripted module.

use ltebridge::config::OperatorMode;
use ltebridge::error::ModemError;
use ltebridge::modem::Verdict;
use ltebridge::modem::commands::INIT_SEQUENCE;
use ltebridge::modem::context::{ModemState, OperatorSelection, SignalQuality};

use crate::mock_modem::{IMSI, ModemSim, bring_up, rig, rig_with, test_config};

// ── Happy path ────────────────────────────────────────────────

#[test]
fn healthy_module_reaches_subscribed() {
    let (mut modem, rig) = rig(ModemSim::healthy());
    let (verdict, steps) = bring_up(&mut modem);

    assert_eq!(verdict, Verdict::Subscribed);
    assert_eq!(steps, INIT_SEQUENCE.len());
    assert_eq!(modem.state(), ModemState::Subscribed);
    assert_eq!(modem.step_index(), 0);
    assert_eq!(rig.sim.boots(), 1);
}

#[test]
fn commands_are_sent_in_order() {
    let (mut modem, rig) = rig(ModemSim::healthy());
    bring_up(&mut modem);

    assert_eq!(
        rig.sim.commands(),
        [
            "ATE0;V0;+CMEE=0",
            "AT+CPIN?",
            "AT+CIMI",
            "AT+CGDCONT=1,\"IP\",\"soracom.io\"",
            "AT+COPS=1,2,\"44020\",8",
            "AT+CSQ",
            "AT+QICSGP=1,1,\"soracom.io\",\"sora\",\"sora\",2",
            "AT+QIACT=1",
            "AT+QIOPEN=1,0,\"UDP\",\"uni.soracom.io\",23080",
            "AT+QMTOPEN=0,\"beam.soracom.io\",1883",
            "AT+QMTCONN=0,\"SampleClient\"",
            "AT+QMTSUB=0,1,\"pico/sample/sub\",1",
        ]
    );
}

#[test]
fn identity_and_signal_quality_are_captured() {
    let (mut modem, _rig) = rig(ModemSim::healthy());
    bring_up(&mut modem);

    assert_eq!(modem.imsi().map(|id| id.as_str()), Some(IMSI));
    assert_eq!(modem.rssi().value(), -83);
}

#[test]
fn power_on_pulses_reset_for_750ms() {
    let (mut modem, rig) = rig(ModemSim::healthy());
    modem.power_on();

    assert_eq!(rig.pin.pulses(), [(0, 750)]);
    assert_eq!(modem.state(), ModemState::Initializing);
}

#[test]
fn red_led_holds_until_subscribed() {
    let (mut modem, _rig) = rig(ModemSim::healthy());
    modem.power_on();
    assert!(modem.indicators_mut().red);

    modem.task_step();
    assert!(modem.indicators_mut().red);

    while modem.task_step() == Verdict::InProgress {}
    let leds = modem.indicators_mut();
    assert!(!leds.red && !leds.green);
}

#[test]
fn signal_quality_step_waits_five_seconds_first() {
    let (mut modem, rig) = rig(ModemSim::healthy());
    modem.power_on();
    // Boot, setup, SIM, IMSI, PDP, register.
    for _ in 0..6 {
        assert_eq!(modem.task_step(), Verdict::InProgress);
    }
    let before = rig.clock.now();
    assert_eq!(modem.task_step(), Verdict::InProgress);
    assert!(rig.clock.now() - before >= 5_000);
}

// ── Operator fallback ─────────────────────────────────────────

#[test]
fn registration_error_toggles_operator_once() {
    let sim = ModemSim::healthy();
    sim.respond_once("AT+COPS", &["ERROR"]);
    let (mut modem, rig) = rig(sim);
    let (verdict, _) = bring_up(&mut modem);

    assert_eq!(verdict, Verdict::Subscribed);
    assert_eq!(modem.operator(), OperatorSelection::Fallback);
    let cops: Vec<_> = rig
        .sim
        .commands()
        .into_iter()
        .filter(|c| c.starts_with("AT+COPS"))
        .collect();
    assert_eq!(cops, ["AT+COPS=1,2,\"44020\",8", "AT+COPS=1,2,\"44010\",8"]);
}

#[test]
fn second_registration_error_fails_the_attempt() {
    let sim = ModemSim::healthy();
    sim.respond("AT+COPS", &["ERROR"]);
    let (mut modem, rig) = rig(sim);
    let (verdict, _) = bring_up(&mut modem);

    assert_eq!(verdict, Verdict::Fail);
    assert_eq!(modem.state(), ModemState::Error);
    assert_eq!(modem.last_error(), Some(ModemError::HardFailure));
    assert_eq!(rig.sim.sent("AT+COPS"), 2);
}

#[test]
fn sim_mode_registers_on_imsi_home_network() {
    let mut config = test_config();
    config.operator_mode = OperatorMode::Sim;
    let (mut modem, rig) = rig_with(ModemSim::healthy(), config);
    bring_up(&mut modem);

    assert_eq!(rig.sim.sent("AT+COPS=1,2,\"44010\",8"), 1);
}

// ── Failures ──────────────────────────────────────────────────

#[test]
fn silent_step_times_out_and_fails() {
    let sim = ModemSim::healthy();
    sim.silence("AT+QIACT");
    let (mut modem, rig) = rig(sim);
    let (verdict, _) = bring_up(&mut modem);

    assert_eq!(verdict, Verdict::Fail);
    assert_eq!(modem.last_error(), Some(ModemError::Timeout));
    // 150 s budget for PDP activation.
    assert!(rig.clock.now() >= 150_000);
}

#[test]
fn sim_not_ready_is_a_protocol_mismatch() {
    let sim = ModemSim::healthy();
    sim.respond("AT+CPIN?", &["+CPIN: SIM PIN", "0"]);
    let (mut modem, _rig) = rig(sim);
    let (verdict, _) = bring_up(&mut modem);

    assert_eq!(verdict, Verdict::Fail);
    assert_eq!(modem.last_error(), Some(ModemError::ProtocolMismatch));
}

#[test]
fn missing_boot_banner_times_out() {
    let sim = ModemSim::healthy();
    sim.set_auto_boot(false);
    let (mut modem, rig) = rig(sim);
    let (verdict, _) = bring_up(&mut modem);

    assert_eq!(verdict, Verdict::Fail);
    assert_eq!(modem.last_error(), Some(ModemError::Timeout));
    assert!(rig.sim.commands().is_empty());
}

#[test]
fn transport_error_fails_the_step() {
    let (mut modem, rig) = rig(ModemSim::healthy());
    modem.power_on();
    rig.sim.set_fail_io(true);

    assert_eq!(modem.task_step(), Verdict::Fail);
    assert_eq!(modem.last_error(), Some(ModemError::Transport));
}

#[test]
fn step_after_failure_requires_reset() {
    let sim = ModemSim::healthy();
    sim.respond("AT+CIMI", &["12345", "0"]);
    let (mut modem, _rig) = rig(sim);
    assert_eq!(bring_up(&mut modem).0, Verdict::Fail);

    let index = modem.step_index();
    assert_eq!(modem.task_step(), Verdict::Fail);
    assert_eq!(modem.step_index(), index);
}

// ── Reset / recovery ──────────────────────────────────────────

#[test]
fn reset_restores_fresh_context() {
    let sim = ModemSim::healthy();
    sim.respond_once("AT+COPS", &["ERROR"]);
    sim.respond("AT+QIACT", &["4"]);
    let (mut modem, _rig) = rig(sim);
    assert_eq!(bring_up(&mut modem).0, Verdict::Fail);
    assert!(modem.imsi().is_some());
    assert_eq!(modem.operator(), OperatorSelection::Fallback);

    assert_eq!(modem.reset(), Verdict::InProgress);

    assert_eq!(modem.state(), ModemState::Initializing);
    assert_eq!(modem.step_index(), 0);
    assert_eq!(modem.rssi(), SignalQuality::UNKNOWN);
    assert!(modem.imsi().is_none());
    assert_eq!(modem.operator(), OperatorSelection::Primary);
}

#[test]
fn timeout_then_reset_clears_signal_quality() {
    let sim = ModemSim::healthy();
    sim.silence("AT+QIACT");
    let (mut modem, _rig) = rig(sim);
    assert_eq!(bring_up(&mut modem).0, Verdict::Fail);
    assert_eq!(modem.last_error(), Some(ModemError::Timeout));
    assert_eq!(modem.rssi().value(), -83);

    assert_eq!(modem.reset(), Verdict::InProgress);

    assert_eq!(modem.step_index(), 0);
    assert_eq!(modem.rssi(), SignalQuality::UNKNOWN);
    assert_eq!(modem.state(), ModemState::Initializing);
}

#[test]
fn reset_flashes_then_pulses_for_one_second() {
    let (mut modem, rig) = rig(ModemSim::healthy());
    modem.power_on();
    let start = rig.clock.now();

    modem.reset();

    // 5 × (100 ms on + 100 ms off), 1 s settle, then a 1 s pulse.
    let pulses = rig.pin.pulses();
    let (low, high) = pulses[pulses.len() - 1];
    assert_eq!(low - start, 2_000);
    assert_eq!(high - low, 1_000);

    let leds = modem.indicators_mut();
    assert!(leds.red, "red holds after the flash");
    // One from power-on, five flashes, one hold.
    assert_eq!(leds.red_flashes(), 7);
}

#[test]
fn recovery_after_reset_reaches_subscribed() {
    let sim = ModemSim::healthy();
    sim.respond_once("AT+QMTCONN", &["0", "+QMTCONN: 0,0,5"]);
    let (mut modem, rig) = rig(sim);
    assert_eq!(bring_up(&mut modem).0, Verdict::Fail);

    modem.reset();
    let mut verdict = Verdict::InProgress;
    while verdict == Verdict::InProgress {
        verdict = modem.task_step();
    }
    assert_eq!(verdict, Verdict::Subscribed);
    assert_eq!(rig.sim.boots(), 2);
}
