use camino::Utf8Path;
use hifitime::{Duration, Epoch};

use trackmap::session::csv_reader::{read_laps_csv, read_positions_csv};
use trackmap::{SessionData, TopologyParams, TrackError, TrackPoint, TrackTopology};

fn load_session() -> SessionData {
    let positions = read_positions_csv(Utf8Path::new("tests/data/positions.csv")).unwrap();
    let laps = read_laps_csv(Utf8Path::new("tests/data/laps.csv")).unwrap();
    SessionData::new(positions, laps).unwrap()
}

#[test]
fn test_read_positions() {
    let positions = read_positions_csv(Utf8Path::new("tests/data/positions.csv")).unwrap();

    assert_eq!(positions.len(), 2);
    assert_eq!(positions["44"].len(), 9);
    assert_eq!(positions["33"].len(), 3);

    // file order is kept by the reader
    let pit = &positions["33"][0];
    assert!(!pit.on_track);
    assert_eq!((pit.x, pit.y), (-40.0, -300.0));

    let t0 = Epoch::from_gregorian_utc_hms(2021, 3, 28, 15, 0, 20);
    assert_eq!(positions["44"][0].date, t0);
    assert_eq!(positions["44"][1].date, t0 + Duration::from_milliseconds(250.0));
}

#[test]
fn test_read_laps() {
    let laps = read_laps_csv(Utf8Path::new("tests/data/laps.csv")).unwrap();
    assert_eq!(laps.len(), 4);

    let first = laps.iter().next().unwrap();
    assert_eq!(first.lap_number, Some(1));
    assert_eq!(first.session_time, Duration::from_seconds(22.0));
    assert!(first.lap_time.is_none());

    assert_eq!(laps.last_lap_number("44"), Some(3));
    assert_eq!(laps.last_lap_number("33"), None);

    // lap 3 is both the last lap and an in-lap
    let usable = laps.usable_laps("44");
    assert_eq!(usable.len(), 1);
    assert_eq!(usable[0].lap_number, Some(2));
    assert_eq!(usable[0].lap_time, Some(Duration::from_seconds(2.0)));
    assert_eq!(usable[0].sector2_time, Some(Duration::from_seconds(0.75)));
    assert!(laps.usable_laps("33").is_empty());
}

#[test]
fn test_session_from_csv() {
    let session = load_session();

    assert_eq!(session.vehicles(), &["33".to_string(), "44".to_string()]);
    assert_eq!(
        session.session_start(),
        Epoch::from_gregorian_utc_hms(2021, 3, 28, 15, 0, 0)
    );

    // series are sorted by date, the off-track sample of "33" moves last
    let series = session.series("33").unwrap();
    assert!(series.windows(2).all(|w| w[0].date <= w[1].date));
    assert!(!series[2].on_track);

    let params = TopologyParams::builder()
        .direction_sample_index(1)
        .build()
        .unwrap();
    let track = TrackTopology::build(session.positions(), params).unwrap();

    assert_eq!(track.len(), 8);
    assert!(track.excluded().is_empty());
    assert!(!track.is_track_point(-40.0, -300.0));

    let date = Epoch::from_gregorian_utc_hms(2021, 3, 28, 15, 0, 20) + Duration::from_seconds(0.625);
    let p = track.position_at_time(&session, "44", date).unwrap();
    assert_eq!(p, TrackPoint::new(200.0, 50.0));
    assert_eq!(p.date, Some(date));
}

#[test]
fn test_missing_file() {
    let err = read_positions_csv(Utf8Path::new("tests/data/missing.csv")).unwrap_err();
    assert!(matches!(err, TrackError::CsvError(_) | TrackError::IoError(_)));
}
