mod common;

use alarm800l::constants::MAX_NUM_LENGTH;
use alarm800l::phone_book::Slot;
use alarm800l::replies::ReplyCode;
use alarm800l::session::GsmStatus;
use common::{CALLER, Rig};

const CONFIRM_TONE: &str = "AT+VTS=\"#\"\n";
const ERROR_TONE: &str = "AT+VTS=\"*,*,*\"\n";

fn answered() -> Rig {
    let mut rig = Rig::ready();
    rig.answer_call(CALLER);
    rig
}

#[test]
fn alarm_off_confirms_and_reports_status() {
    let mut rig = answered();

    assert_eq!(rig.tones("###"), Some(ReplyCode::GetParams));
    assert!(!rig.alarm.enabled);
    assert_eq!(rig.sent(), "AT+CPBR=1,3\n");

    rig.reply("\r\n+CPBR: 1,\"5551234\",129,\"\"\r\n");
    rig.ok();
    assert_eq!(rig.sent(), CONFIRM_TONE);
    // Battery refresh and status SMS.
    assert_eq!(rig.engine.pending_commands(), 2);
    rig.ok();
    assert_eq!(rig.engine.status(), GsmStatus::CallAnswered);

    assert_eq!(rig.tones("##*"), Some(ReplyCode::GetParams));
    assert!(rig.alarm.enabled);
}

#[test]
fn settings_follow_tones() {
    let mut rig = answered();

    assert_eq!(rig.tones("**250**"), Some(ReplyCode::GetParams));
    assert_eq!(rig.alarm.threshold, 25.0);
    rig.ok();
    rig.ok();

    assert_eq!(rig.tones("##0"), Some(ReplyCode::GetParams));
    assert!(!rig.alarm.auto_rearm);
}

#[test]
fn phonebook_edits_from_tones() {
    let mut rig = answered();
    let slot2 = Slot::new(2).unwrap();

    assert_eq!(rig.tones("#2##"), Some(ReplyCode::DtmfStar));
    assert_eq!(rig.sent(), ERROR_TONE);
    assert_eq!(rig.engine.pending_commands(), 0);
    rig.ok();

    assert_eq!(rig.tones("*2*5551234567**"), Some(ReplyCode::DtmfSharp));
    assert_eq!(rig.engine.phonebook().number(slot2), "5551234567");
    rig.ok();
    assert_eq!(rig.tones("#2##"), Some(ReplyCode::DtmfSharp));
    assert_eq!(rig.engine.pending_commands(), 2);
}

#[test]
fn help_menu_is_sent_by_sms() {
    let mut rig = answered();

    assert_eq!(rig.tones("#*"), Some(ReplyCode::Help));
    assert_eq!(rig.sent(), CONFIRM_TONE);
    assert_eq!(rig.engine.pending_commands(), 1);
    rig.ok();

    rig.reply("\r\nNO CARRIER\r\n");
    rig.poll();
    rig.poll();
    assert_eq!(rig.sent(), format!("AT+CMGS=\"{CALLER}\"\r\n"));
    rig.reply("> ");
    assert_eq!(rig.sent(), "\r\n");
    rig.reply("> ");
    assert!(rig.sent().starts_with("TEST "));
}

#[test]
fn reset_tone_restarts_the_controller() {
    let mut rig = answered();

    assert_eq!(rig.tones("#0#"), Some(ReplyCode::Reset));
    assert_eq!(rig.sent(), "ATH\n");
    assert_eq!(rig.platform.resets, 1);
    assert!(rig.platform.delays_ms.contains(&rig.engine.config().reset_delay_ms));
    assert_eq!(rig.engine.status(), GsmStatus::Error);

    assert_eq!(rig.ok(), Some(ReplyCode::Ok));
    assert_eq!(rig.engine.status(), GsmStatus::Error);
    assert_eq!(rig.sent(), "");
}

#[test]
fn invalid_sequences_play_the_error_tone() {
    let mut rig = answered();

    assert_eq!(rig.tones("*9"), Some(ReplyCode::DtmfStar));
    assert_eq!(rig.sent(), ERROR_TONE);
    rig.ok();

    let overlong = format!("*1*{}", "9".repeat(MAX_NUM_LENGTH + 1));
    assert_eq!(rig.tones(&overlong), Some(ReplyCode::DtmfStar));
    assert_eq!(rig.sent(), ERROR_TONE);
    assert_eq!(rig.engine.pending_commands(), 0);
}

#[test]
fn hang_up_discards_partial_tones() {
    let mut rig = answered();

    assert_eq!(rig.tones("##"), None);
    rig.reply("\r\nNO CARRIER\r\n");
    rig.answer_call(CALLER);
    // A fresh `#` then `*` is the help request, not `##*`.
    assert_eq!(rig.tones("#*"), Some(ReplyCode::Help));
}
