use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use tempfile::{TempDir, tempdir};

use super::*;
use crate::journal::MemberCondition;
use crate::state::PartyMember;
use crate::types::{BattleOutcome, Choice, ChoicePromptId, SpeciesKey, StatusEffect};

fn scratch(name: &str) -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join(name);
    (dir, path)
}

fn initial_run() -> RunState {
    let mut run = RunState::new(42, 30);
    run.money = 1_200;
    run.party.add(PartyMember::new("EEVEE", 25));
    run
}

fn battle(outcome: BattleOutcome) -> InputPayload {
    let fainted = MemberCondition { slot: 0, hp: 0, status: StatusEffect::Faint };
    InputPayload::BattleOutcome { outcome, party: vec![fainted] }
}

fn choice(prompt: u64, index: usize) -> InputPayload {
    InputPayload::Choice { prompt_id: ChoicePromptId(prompt), choice: Choice::SelectOption(index) }
}

fn write_sample(path: &Path, payloads: &[InputPayload]) -> Vec<String> {
    let mut writer = SessionWriter::create(path, "dev", &"SAMPLE".into(), &initial_run()).unwrap();
    for payload in payloads {
        writer.append(payload).unwrap();
    }
    drop(writer);
    fs::read_to_string(path).unwrap().lines().map(String::from).collect()
}

#[test]
fn header_and_records_survive_a_round_trip() {
    let (_dir, path) = scratch("roundtrip.jsonl");
    let encounter_type = EncounterType::from("SHADY_MERCHANT");

    let mut writer = SessionWriter::create(&path, "test-build", &encounter_type, &initial_run()).unwrap();
    writer.append(&choice(0, 0)).unwrap();
    writer.append(&InputPayload::PartySelection { slot: Some(0) }).unwrap();
    writer.append(&battle(BattleOutcome::Victory)).unwrap();

    let loaded = load_session_from_file(&path).unwrap();
    let journal = &loaded.journal;
    assert_eq!(journal.format_version, 1);
    assert_eq!(journal.build_id, "test-build");
    assert_eq!(journal.encounter_type, encounter_type);
    assert_eq!(journal.initial_run.seed, 42);
    assert_eq!(journal.initial_run.money, 1_200);
    assert_eq!(journal.initial_run.party.members()[0].species, SpeciesKey::from("EEVEE"));

    let payloads: Vec<&InputPayload> = journal.inputs.iter().map(|record| &record.payload).collect();
    assert_eq!(
        payloads,
        [
            &choice(0, 0),
            &InputPayload::PartySelection { slot: Some(0) },
            &battle(BattleOutcome::Victory),
        ]
    );
    assert_eq!(journal.inputs[2].seq, 2);
    assert_eq!(loaded.next_seq, 3);
    assert_ne!(loaded.last_sha256_hex, INITIAL_HASH);
}

#[test]
fn edited_record_breaks_the_chain_at_its_line() {
    let (_dir, path) = scratch("tampered.jsonl");
    let mut lines = write_sample(
        &path,
        &[choice(0, 0), battle(BattleOutcome::Defeat)],
    );
    assert_eq!(lines.len(), 3);

    lines[2] = lines[2].replace("Defeat", "Victory");
    fs::write(&path, lines.join("\n") + "\n").unwrap();

    let result = load_session_from_file(&path);
    assert!(
        matches!(result, Err(SessionLoadError::HashChainBroken { line: 3 })),
        "expected hash chain broken at line 3, got: {result:?}"
    );
}

#[test]
fn dropped_record_is_detected() {
    let (_dir, path) = scratch("deleted.jsonl");
    let lines = write_sample(&path, &[choice(0, 1), choice(2, 1), choice(4, 1)]);
    fs::write(&path, format!("{}\n{}\n{}\n", lines[0], lines[1], lines[3])).unwrap();

    let result = load_session_from_file(&path);
    assert!(
        matches!(
            result,
            Err(SessionLoadError::HashChainBroken { .. }) | Err(SessionLoadError::InvalidRecord { line: 3, .. })
        ),
        "expected chain corruption error, got: {result:?}"
    );
}

#[test]
fn cut_off_last_line_is_incomplete() {
    let (_dir, path) = scratch("truncated.jsonl");
    write_sample(&path, &[choice(0, 0)]);

    let mut file = OpenOptions::new().append(true).open(&path).unwrap();
    write!(file, "{{\"seq\":1,\"pay").unwrap();

    let result = load_session_from_file(&path);
    assert!(
        matches!(result, Err(SessionLoadError::IncompleteLine { line: 3 })),
        "expected incomplete line at line 3, got: {result:?}"
    );
}

#[test]
fn empty_garbage_and_missing_files_are_rejected() {
    let dir = tempdir().unwrap();
    let empty = dir.path().join("empty.jsonl");
    fs::write(&empty, "").unwrap();
    assert!(matches!(load_session_from_file(&empty), Err(SessionLoadError::EmptyFile)));

    let garbage = dir.path().join("bad_header.jsonl");
    fs::write(&garbage, "not valid json\n").unwrap();
    assert!(matches!(
        load_session_from_file(&garbage),
        Err(SessionLoadError::InvalidHeader { line: 1, .. })
    ));

    let missing = dir.path().join("missing.jsonl");
    assert!(matches!(load_session_from_file(&missing), Err(SessionLoadError::Io(_))));
}

#[test]
fn resumed_writer_extends_the_same_chain() {
    let (_dir, path) = scratch("nested/resume.jsonl");
    write_sample(&path, &[choice(0, 0)]);

    let loaded = load_session_from_file(&path).unwrap();
    assert_eq!(loaded.journal.inputs.len(), 1);

    let mut writer = SessionWriter::resume(&path, loaded.last_sha256_hex, loaded.next_seq).unwrap();
    writer.append(&InputPayload::SubOption { index: None }).unwrap();
    drop(writer);

    let reloaded = load_session_from_file(&path).unwrap();
    assert_eq!(reloaded.journal.inputs.len(), 2);
    assert_eq!(reloaded.journal.inputs[1].seq, 1);
    assert_eq!(reloaded.next_seq, 2);
}

#[test]
fn in_memory_journal_writes_and_reloads() {
    let (_dir, path) = scratch("journal.jsonl");
    let mut journal = InputJournal::new("SAMPLE".into(), initial_run());
    journal.append_choice(ChoicePromptId(0), Choice::SelectOption(1), 0);
    journal.append(InputPayload::SubOption { index: Some(2) }, 1);

    SessionWriter::write_journal(&path, &journal).unwrap();
    let loaded = load_session_from_file(&path).unwrap();
    assert_eq!(loaded.journal.inputs, journal.inputs);
    assert_eq!(loaded.journal.encounter_type, journal.encounter_type);
}
