use chronon::{
    Chronon, Compound, Concurrence, Consecution, Duration, Envelope, Event, EventConfig, Metrizer,
    TempoConverter, TempoPoint,
};

fn d(value: u32) -> Duration {
    Duration::from(value)
}

fn assert_close(actual: Duration, expected: f64) {
    assert!(
        (actual.to_f64() - expected).abs() < 1e-6,
        "expected {} but got {}",
        expected,
        actual
    );
}

fn steady(beats_per_minute: f64) -> Envelope {
    Envelope::from_points(vec![(d(0), beats_per_minute)]).unwrap()
}

fn leaves(durations: &[u32]) -> Vec<Event> {
    durations
        .iter()
        .map(|duration| Event::from(Chronon::new(*duration)))
        .collect()
}

#[test]
fn test_accelerando_shortens_later_beats() {
    let accelerando = Envelope::from_points(vec![(d(0), 30.0), (d(4), 60.0)]).unwrap();
    let converter = TempoConverter::new(&accelerando).unwrap();
    let event = Event::from(Consecution::from_events(leaves(&[2, 2])));
    let converted = converter.convert(&event).unwrap();

    let durations: Vec<Duration> = converted.children().iter().map(Event::duration).collect();
    assert_close(durations[0], 3.5);
    assert_close(durations[1], 2.5);
    assert_close(converted.duration(), 6.0);
}

#[test]
fn test_metrize_voices_with_own_tempi() {
    let violin = Consecution::from_events(leaves(&[2, 2]))
        .with_tag("violin")
        .with_tempo_envelope(steady(30.0));
    let cello = Consecution::from_events(leaves(&[4])).with_tag("cello");
    let mut score = Event::from(
        Concurrence::from_events(vec![Event::from(violin), Event::from(cello)])
            .with_tempo_envelope(steady(120.0)),
    );
    score.metrize().unwrap();

    let voices = score.as_concurrence().unwrap();
    assert_close(voices.children()[0].duration(), 4.0);
    assert_close(voices.children()[1].duration(), 2.0);
    assert_close(score.duration(), 4.0);
    assert!(score.tempo_envelope().is_none());
    assert!(voices.children().iter().all(|voice| voice.tempo_envelope().is_none()));
}

#[test]
fn test_reference_tempo_from_config() {
    let config = EventConfig::from_yaml_str("reference_tempo:\n  beats_per_minute: 120.0\n").unwrap();
    assert_eq!(config.reference_tempo, TempoPoint::from_beats_per_minute(120.0).unwrap());

    let event = Event::from(Chronon::new(3u32).with_tempo_envelope(steady(60.0)));
    let metrized = Metrizer::default().with_config(config.clone()).convert(&event).unwrap();
    assert_close(metrized.duration(), 6.0);

    // At the reference tempo nothing changes and exact durations survive
    let event = Event::from(Chronon::new(3u32).with_tempo_envelope(steady(120.0)));
    let metrized = Metrizer::default().with_config(config).convert(&event).unwrap();
    assert_eq!(metrized.duration(), d(3));
    assert!(metrized.duration().is_exact());
}

#[test]
fn test_tempo_with_reference_note_value() {
    // 30 beats per minute of half the reference is 60 absolute
    let tempo = TempoPoint::new(30.0, 2.0).unwrap();
    let envelope = Envelope::from_tempo_points(vec![(d(0), tempo)]).unwrap();
    let event = Event::from(Chronon::new(5u32).with_tempo_envelope(envelope));
    let metrized = Metrizer::default().convert(&event).unwrap();
    assert_eq!(metrized.duration(), d(5));
}

#[test]
fn test_metrize_keeps_structure_and_parameters() {
    let melody = Consecution::from_events(vec![
        Event::from(Chronon::new(1u32).with_parameter("pitch", "g")),
        Event::from(Chronon::new(1u32).with_parameter("pitch", "a")),
    ])
    .with_tempo_envelope(steady(30.0));
    let event = Event::from(melody);
    let metrized = Metrizer::default().convert(&event).unwrap();

    assert_eq!(metrized.children().len(), 2);
    assert_eq!(
        metrized.get_parameter("pitch", false, false).unwrap(),
        event.get_parameter("pitch", false, false).unwrap()
    );
    assert_close(metrized.duration(), 4.0);
    // The input tree keeps its beats
    assert_eq!(event.duration(), d(2));
}

#[test]
fn test_metrize_with_depth_limits() {
    let inner = Consecution::from_events(leaves(&[1, 1])).with_tempo_envelope(steady(30.0));
    let event = Event::from(
        Consecution::from_events(vec![Event::from(inner)]).with_tempo_envelope(steady(30.0)),
    );

    let only_root = Metrizer::new(None, Some(1)).convert(&event).unwrap();
    assert_close(only_root.duration(), 4.0);
    assert!(only_root.tempo_envelope().is_none());
    assert!(only_root.children()[0].tempo_envelope().is_some());

    let below_root = Metrizer::new(Some(0), None).convert(&event).unwrap();
    assert_close(below_root.duration(), 4.0);
    assert!(below_root.tempo_envelope().is_some());
    assert!(below_root.children()[0].tempo_envelope().is_none());

    let everything = Metrizer::default().convert(&event).unwrap();
    assert_close(everything.duration(), 8.0);
}
