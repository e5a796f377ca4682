// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Integration tests for scoreplay
//!
//! These tests drive the playback model through the public API: load a
//! score, edit it, send change notifications, and check what subscribers
//! receive.

use std::sync::Arc;

use scoreplay::config::{PlaybackSettings, ScoreFile};
use scoreplay::events::{DynamicType, PitchLevel};
use scoreplay::score::{Annotation, ChordRest, Instrument, Part, PartId};
use scoreplay::timing::TimeSignature;
use scoreplay::{
    changes_channel, shared_score, ChangesSender, ItemRef, PlaybackError, PlaybackEvent, PlaybackModel, Score,
    ScoreChangesRange, SharedScore, TrackKey, TrackLifecycleEvent,
};

fn flute() -> Part {
    Part::new(PartId(1), "Flute", 1).with_instrument(0, Instrument::new("flute", "flutes"))
}

fn violin() -> Part {
    Part::new(PartId(2), "Violin", 1).with_instrument(0, Instrument::new("violin", "strings"))
}

/// One 4/4 measure with middle C on the flute at tick 0
fn single_note_score() -> Score {
    let mut score = Score::new("Single");
    score.add_part(flute());
    score.append_measures(1, TimeSignature::default());
    score.set_element(0, 0, ChordRest::chord(&[60], 480)).unwrap();
    score
}

fn load(score: Score) -> (PlaybackModel, SharedScore, ChangesSender) {
    let shared = shared_score(score);
    let (tx, rx) = changes_channel();
    let mut model = PlaybackModel::new();
    model.load(Arc::clone(&shared), rx);
    (model, shared, tx)
}

fn flute_key() -> TrackKey {
    TrackKey::new(PartId(1), "flute")
}

/// Test the basic scenario: one note, one track plus the metronome
#[test]
fn test_single_note_at_mezzo_forte() {
    let (model, _, _) = load(single_note_score());

    assert_eq!(model.track_keys(), vec![flute_key(), TrackKey::metronome()]);

    let data = model.track_playback_data(PartId(1), "flute").unwrap();
    let timeline = data.origin_events();
    assert_eq!(timeline.len(), 1);

    let events = timeline.get(0).unwrap();
    assert_eq!(events.len(), 1);
    let note = events[0].as_note().unwrap();
    assert_eq!(note.timestamp, 0);
    assert_eq!(note.pitch_level, PitchLevel::from_midi(60));
    assert_eq!(note.nominal_dynamic_level, DynamicType::Mf.level());
    assert_eq!(note.nominal_duration, 500_000);
}

/// Test that a dynamic edit republishes only the affected timestamp
#[test]
fn test_dynamic_edit_republishes_slice() {
    let (mut model, shared, tx) = load(single_note_score());
    let mut main = model
        .track_playback_data(PartId(1), "flute")
        .unwrap()
        .subscribe_main();

    let end = {
        let mut score = shared.write().unwrap();
        score.add_annotation(0, Annotation::dynamic(0, DynamicType::Ff)).unwrap();
        score.end_tick()
    };
    tx.notify(0, end, 0, 1);
    assert_eq!(model.process_pending_changes(), 1);

    let slice = main.try_recv().unwrap();
    assert_eq!(slice.keys().copied().collect::<Vec<_>>(), vec![0]);
    let note = slice[&0][0].as_note().unwrap();
    assert_eq!(note.nominal_dynamic_level, DynamicType::Ff.level());
    assert!(main.try_recv().is_err());
}

/// Test that a repeated measure renders every note and click twice
#[test]
fn test_simple_repeat_doubles_events() {
    let mut score = single_note_score();
    score.set_repeat_start(0, true).unwrap();
    score.set_repeat_end(0, Some(2)).unwrap();
    let (model, _, _) = load(score);

    let flute = model.track_playback_data(PartId(1), "flute").unwrap();
    let stamps: Vec<_> = flute.origin_events().timestamps().collect();
    assert_eq!(stamps, vec![0, 2_000_000]);

    let metronome = model.metronome_playback_data().unwrap();
    let clicks: Vec<_> = metronome.origin_events().timestamps().collect();
    assert_eq!(clicks, vec![0, 2_000_000]);
    for (_, events) in metronome.origin_events().iter() {
        assert!(matches!(&events[0], PlaybackEvent::Metronome(click) if click.accented));
    }
}

/// Test that notifying the same range twice changes nothing
#[test]
fn test_repeated_notification_is_idempotent() {
    let (mut model, shared, tx) = load(single_note_score());
    let before = model
        .track_playback_data(PartId(1), "flute")
        .unwrap()
        .origin_events()
        .clone();

    let full = ScoreChangesRange::full(&shared.read().unwrap());
    assert!(tx.send(full));
    assert!(tx.send(full));
    assert_eq!(model.process_pending_changes(), 2);

    let after = model
        .track_playback_data(PartId(1), "flute")
        .unwrap()
        .origin_events()
        .clone();
    assert_eq!(before, after);
    assert_eq!(after.event_count(), 1);
}

/// Test that a change confined to one part leaves other parts untouched
#[test]
fn test_change_confined_to_range() {
    let mut score = single_note_score();
    score.add_part(violin());
    score.set_element(4, 0, ChordRest::chord(&[67], 960)).unwrap();
    score.set_element(4, 960, ChordRest::chord(&[69], 960)).unwrap();
    let (mut model, shared, tx) = load(score);

    let mut flute_rx = model.track_playback_data(PartId(1), "flute").unwrap().subscribe_main();
    let mut violin_rx = model.track_playback_data(PartId(2), "violin").unwrap().subscribe_main();
    let mut metronome_rx = model.metronome_playback_data().unwrap().subscribe_main();
    let violin_before = model
        .track_playback_data(PartId(2), "violin")
        .unwrap()
        .origin_events()
        .clone();

    shared
        .write()
        .unwrap()
        .set_element(0, 960, ChordRest::chord(&[62], 480))
        .unwrap();
    tx.notify(960, 1920, 0, 1);
    model.process_pending_changes();

    let slice = flute_rx.try_recv().unwrap();
    assert_eq!(slice.keys().copied().collect::<Vec<_>>(), vec![1_000_000]);
    assert!(violin_rx.try_recv().is_err());

    // The metronome follows every sweep, whatever the track range
    let clicks = metronome_rx.try_recv().unwrap();
    assert_eq!(clicks.keys().copied().collect::<Vec<_>>(), vec![1_000_000]);

    let violin_after = model
        .track_playback_data(PartId(2), "violin")
        .unwrap()
        .origin_events()
        .clone();
    assert_eq!(violin_before, violin_after);
}

/// Test that a deleted note is republished as an empty slice
#[test]
fn test_deleted_note_published_empty() {
    let mut score = single_note_score();
    score.set_element(0, 960, ChordRest::chord(&[62], 480)).unwrap();
    let (mut model, shared, tx) = load(score);
    let mut main = model.track_playback_data(PartId(1), "flute").unwrap().subscribe_main();

    shared.write().unwrap().remove_element(0, 960).unwrap();
    tx.notify(960, 1920, 0, 1);
    model.process_pending_changes();

    let slice = main.try_recv().unwrap();
    assert_eq!(slice.len(), 1);
    assert!(slice[&1_000_000].is_empty());

    let timeline = model.track_playback_data(PartId(1), "flute").unwrap().origin_events();
    assert!(timeline.get(1_000_000).is_none());
    assert_eq!(timeline.len(), 1);
}

/// Test that removing a part expires its track and announces the change
#[test]
fn test_removed_part_expires() {
    let mut score = single_note_score();
    score.add_part(violin());
    score.set_element(4, 0, ChordRest::chord(&[67], 480)).unwrap();
    let (mut model, shared, tx) = load(score);
    let mut lifecycle = model.track_events();

    shared.write().unwrap().remove_part(PartId(2)).unwrap();
    tx.notify(0, 1920, 0, 4);
    model.process_pending_changes();

    assert!(matches!(
        model.track_playback_data(PartId(2), "violin"),
        Err(PlaybackError::TrackNotFound { .. })
    ));
    assert!(model.track_playback_data(PartId(1), "flute").is_ok());
    assert!(model.metronome_playback_data().is_ok());
    assert_eq!(
        lifecycle.try_recv().unwrap(),
        TrackLifecycleEvent::Removed(TrackKey::new(PartId(2), "violin"))
    );
}

/// Test that an instrument change creates a new track and announces it
#[test]
fn test_instrument_change_adds_track() {
    let mut score = single_note_score();
    score.append_measures(1, TimeSignature::default());
    score.set_element(0, 1920, ChordRest::chord(&[72], 480)).unwrap();
    let (mut model, shared, tx) = load(score);
    let mut lifecycle = model.track_events();

    shared
        .write()
        .unwrap()
        .set_instrument(PartId(1), 1920, Instrument::new("piccolo", "flutes"))
        .unwrap();
    tx.notify(1920, 3840, 0, 1);
    model.process_pending_changes();

    assert_eq!(
        lifecycle.try_recv().unwrap(),
        TrackLifecycleEvent::Added(TrackKey::new(PartId(1), "piccolo"))
    );
    let piccolo = model.track_playback_data(PartId(1), "piccolo").unwrap();
    assert_eq!(piccolo.origin_events().timestamps().collect::<Vec<_>>(), vec![2_000_000]);
}

/// Test that triggering a chord publishes matching notes on the off stream
#[test]
fn test_trigger_matches_rendered_notes() {
    let mut score = single_note_score();
    score.set_element(0, 960, ChordRest::chord(&[64, 67], 480)).unwrap();
    let (model, _, _) = load(score);
    let mut off = model.track_playback_data(PartId(1), "flute").unwrap().subscribe_off();

    model.trigger_events_for_item(ItemRef::ChordRest { track: 0, tick: 960 });
    let slice = off.try_recv().unwrap();
    let pitches: Vec<_> = slice[&1_000_000].iter().filter_map(PlaybackEvent::pitch_level).collect();
    assert_eq!(pitches, vec![PitchLevel::from_midi(64), PitchLevel::from_midi(67)]);
}

/// Test that a trigger with nothing rendered publishes nothing
#[test]
fn test_trigger_without_match_is_silent() {
    let (model, shared, _) = load(single_note_score());
    let mut off = model.track_playback_data(PartId(1), "flute").unwrap().subscribe_off();

    // Edit without notifying: the rendered timeline still has the old pitch
    shared
        .write()
        .unwrap()
        .set_element(0, 0, ChordRest::chord(&[61], 480))
        .unwrap();
    model.trigger_events_for_item(ItemRef::ChordRest { track: 0, tick: 0 });
    assert!(off.try_recv().is_err());
}

/// Test that a trigger inside a repeat uses the first pass
#[test]
fn test_trigger_in_repeat_uses_first_pass() {
    let mut score = single_note_score();
    score.set_repeat_end(0, Some(2)).unwrap();
    let (model, _, _) = load(score);
    let mut off = model.track_playback_data(PartId(1), "flute").unwrap().subscribe_off();

    model.trigger_events_for_item(ItemRef::Note {
        track: 0,
        tick: 0,
        index: 0,
    });
    let slice = off.try_recv().unwrap();
    assert_eq!(slice.keys().copied().collect::<Vec<_>>(), vec![0]);
}

/// Test the async processing path
#[tokio::test]
async fn test_next_change_processes_notifications() {
    let (mut model, shared, tx) = load(single_note_score());
    let mut main = model.track_playback_data(PartId(1), "flute").unwrap().subscribe_main();

    shared
        .write()
        .unwrap()
        .set_element(0, 480, ChordRest::chord(&[65], 480))
        .unwrap();
    tx.notify(480, 960, 0, 1);
    assert!(model.next_change().await);
    assert_eq!(main.try_recv().unwrap().keys().copied().collect::<Vec<_>>(), vec![500_000]);

    drop(tx);
    assert!(!model.next_change().await);
}

/// Test loading a score from YAML through to rendered events
#[test]
fn test_yaml_score_end_to_end() {
    let yaml = r#"
title: "Round"
tempo: 60
parts:
  - id: 3
    name: Strings
    instruments: [{ id: violin, family: strings }]
measures:
  - time_signature: "3/4"
    voices:
      - track: 0
        items:
          - { notes: [67], duration: 480, articulations: [pizzicato] }
          - { notes: [69], duration: 960 }
    annotations:
      - { staff: 0, dynamic: pp }
"#;
    let score = ScoreFile::from_yaml(yaml).unwrap().to_score().unwrap();
    let shared = shared_score(score);
    let (_tx, rx) = changes_channel();
    let settings = PlaybackSettings {
        metronome: false,
        ..PlaybackSettings::default()
    };
    let mut model = PlaybackModel::new().with_settings(settings);
    model.load(shared, rx);

    assert!(model.metronome_playback_data().is_err());
    let violin = model.track_playback_data(PartId(3), "violin").unwrap();
    assert_eq!(
        violin.origin_events().timestamps().collect::<Vec<_>>(),
        vec![0, 1_000_000]
    );
    let pizz = violin.origin_events().get(0).unwrap()[0].as_note().unwrap();
    assert_eq!(pizz.duration, 300_000);
    assert_eq!(pizz.nominal_dynamic_level, DynamicType::Pp.level());
}

/// Test that an edit inside a repeat republishes every pass and nothing after it
#[test]
fn test_edit_inside_repeat_republishes_every_pass() {
    let mut score = single_note_score();
    score.set_repeat_start(0, true).unwrap();
    score.set_repeat_end(0, Some(2)).unwrap();
    score.append_measures(1, TimeSignature::default());
    score.set_element(0, 1920, ChordRest::chord(&[62], 480)).unwrap();
    let (mut model, shared, tx) = load(score);

    let flute = model.track_playback_data(PartId(1), "flute").unwrap();
    let stamps: Vec<_> = flute.origin_events().timestamps().collect();
    assert_eq!(stamps, vec![0, 2_000_000, 4_000_000]);
    let mut main = flute.subscribe_main();

    shared
        .write()
        .unwrap()
        .add_annotation(0, Annotation::dynamic(0, DynamicType::Ff))
        .unwrap();
    tx.notify(0, 1920, 0, 1);
    model.process_pending_changes();

    let slice = main.try_recv().unwrap();
    assert_eq!(slice.keys().copied().collect::<Vec<_>>(), vec![0, 2_000_000]);
    for events in slice.values() {
        assert_eq!(events[0].as_note().unwrap().nominal_dynamic_level, DynamicType::Ff.level());
    }
    assert!(main.try_recv().is_err());

    let timeline = model.track_playback_data(PartId(1), "flute").unwrap().origin_events();
    let after_repeat = timeline.get(4_000_000).unwrap()[0].as_note().unwrap();
    assert_eq!(after_repeat.nominal_dynamic_level, DynamicType::Mf.level());
}

/// Test that deleting a marked chord stops its dynamic applying to later notes
#[test]
fn test_deleted_marked_chord_releases_dynamic() {
    let mut score = single_note_score();
    score.set_element(0, 960, ChordRest::chord(&[62], 480)).unwrap();
    score.set_element(0, 1440, ChordRest::chord(&[64], 480)).unwrap();
    score.add_annotation(960, Annotation::dynamic(0, DynamicType::Ff)).unwrap();
    let (mut model, shared, tx) = load(score);
    let mut main = model.track_playback_data(PartId(1), "flute").unwrap().subscribe_main();

    {
        let mut score = shared.write().unwrap();
        score.remove_element(0, 960).unwrap();
        score.clear_annotations(960, 0).unwrap();
    }
    tx.notify(0, 1920, 0, 1);
    model.process_pending_changes();

    let slice = main.try_recv().unwrap();
    assert!(slice[&1_000_000].is_empty());
    let note = slice[&1_500_000][0].as_note().unwrap();
    assert_eq!(note.nominal_dynamic_level, DynamicType::Mf.level());
}
