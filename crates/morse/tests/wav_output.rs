use morse::{RecordingSink, Session, SessionConfig, WavSink};
use pretty_assertions::assert_eq;

#[test]
fn test_wav_file_matches_recorded_audio() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cq.wav");
    let config = SessionConfig::new(22).with_tone_frequency(650.0);

    let mut wav = Session::new(WavSink::create(&path), config.clone()).unwrap();
    wav.send_string("CQ CQ <AR>").unwrap();
    wav.drain().unwrap();
    wav.close().unwrap();

    let mut recorded = Session::new(RecordingSink::new(), config).unwrap();
    recorded.send_string("CQ CQ <AR>").unwrap();
    recorded.drain().unwrap();

    let mut reader = hound::WavReader::open(&path).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_rate, 44100);
    assert_eq!(spec.bits_per_sample, 16);

    let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(samples.len(), recorded.sink().samples().len());
    assert!(samples == recorded.sink().samples());
    assert_eq!(reader.duration() as u64, wav.sample_count());
}

#[test]
fn test_unused_wav_session_creates_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("never.wav");

    let mut session = Session::with_wpm(WavSink::create(&path), 18).unwrap();
    session.drain().unwrap();
    session.close().unwrap();

    assert!(!path.exists());
}
