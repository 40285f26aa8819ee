use chrono::{TimeZone, Utc};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use student_dashboard::charts::{DonutChart, DonutOptions, RadarChart, RadarOptions};
use student_dashboard::data::{
    Gender, LoadError, LoadOptions, RecordLoader, ScoreBand, ScoreField, Source,
};
use tempfile::NamedTempFile;

const QUESTIONNAIRE: &str = "\
gender,age,code,work,primary_score,math_score,number_of_repetition
F,2000-01-01,101,Yes,12,9,0
M,1999-06-15,102,No,4.5,15,1
,2003-02-28,103,No,,20,
F,2001-12-31,104,Yes,19,,2
";

fn loader() -> RecordLoader {
    RecordLoader::new(LoadOptions {
        now: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
        ..LoadOptions::default()
    })
}

fn csv_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn single_row_end_to_end() {
    let file = csv_file("gender,age,code,primary_score\nF,2000-01-01,101,12\n");
    let snapshot = loader()
        .load(&Source::Path(file.path().to_path_buf()))
        .expect("load");

    assert_eq!(snapshot.len(), 1);
    let record = &snapshot.records()[0];
    assert_eq!(record.gender(), Gender::Female);
    assert_eq!(record.age().to_string(), "24 years old");
    assert_eq!(record.code(), 101);
    assert_eq!(record.score(ScoreField::Primary), Some(12.0));
    assert_eq!(record.band(ScoreField::Primary), Some(ScoreBand::From10To14));
}

#[test]
fn one_record_per_row_in_source_order() {
    let file = csv_file(QUESTIONNAIRE);
    let source = Source::parse(file.path().to_str().unwrap()).unwrap();
    let snapshot = loader().load(&source).expect("load");

    assert_eq!(snapshot.codes(), vec![101, 102, 103, 104]);
    assert_eq!(snapshot.records()[2].gender(), Gender::Male);
    assert_eq!(snapshot.records()[2].score(ScoreField::Primary), None);
    assert_eq!(snapshot.records()[2].band(ScoreField::Primary), None);
    assert_eq!(
        snapshot.records()[1].band(ScoreField::Primary),
        Some(ScoreBand::Below5)
    );
}

#[test]
fn loading_twice_gives_equal_snapshots() {
    let file = csv_file(QUESTIONNAIRE);
    let source = Source::Path(file.path().to_path_buf());
    let loader = loader();
    assert_eq!(loader.load(&source).unwrap(), loader.load(&source).unwrap());
}

#[test]
fn snapshot_serializes_as_flat_records() {
    let snapshot = loader().load_bytes(QUESTIONNAIRE.as_bytes()).expect("load");
    let json = serde_json::to_value(&snapshot).unwrap();

    let first = &json[0];
    assert_eq!(first["gender"], "Female");
    assert_eq!(first["age"], "24 years old");
    assert_eq!(first["code"], 101);
    assert_eq!(first["work"], "Yes");
    assert_eq!(first["primary_score"], 12.0);
    assert_eq!(first["primary_score_range"], "10-14");
    assert_eq!(first["math_score_range"], "5-9");
    assert!(first["college_score"].is_null());
    assert!(json[2]["primary_score_range"].is_null());
}

#[test]
fn invalid_score_fails_the_whole_load() {
    let csv = "gender,age,code,primary_score\nF,2000-01-01,1,12\nM,2000-01-01,2,twelve\n";
    let err = loader().load_bytes(csv.as_bytes()).unwrap_err();
    let message = err.to_string();
    assert!(matches!(err, LoadError::Derive(_)));
    assert!(message.contains("line 3"), "{message}");
    assert!(message.contains("primary_score"), "{message}");
}

#[test]
fn missing_file_is_a_fetch_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = loader()
        .load(&Source::Path(dir.path().join("students.csv")))
        .unwrap_err();
    assert!(matches!(err, LoadError::Fetch(_)));
}

#[test]
fn charts_read_the_loaded_snapshot() {
    let snapshot = loader().load_bytes(QUESTIONNAIRE.as_bytes()).expect("load");

    let donut = DonutChart::new(DonutOptions::default())
        .layout(&snapshot, "gender")
        .expect("donut");
    assert_eq!(donut.total, 4);
    let counted: usize = donut.slices.iter().map(|s| s.count).sum();
    assert_eq!(counted, 4);

    let radar = RadarChart::new(RadarOptions::default())
        .compare(&snapshot, &[101, 104])
        .expect("radar");
    assert_eq!(radar.polygons.len(), 2);
    assert_eq!(radar.axes.len(), 6);
}

#[test]
fn loads_over_http() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => return,
                Ok(n) => head.extend_from_slice(&buf[..n]),
            }
        }
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/csv\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            QUESTIONNAIRE.len(),
            QUESTIONNAIRE
        );
        let _ = stream.write_all(response.as_bytes());
    });

    let source = Source::parse(&format!("http://{addr}/academic-questionnaire.csv")).unwrap();
    let snapshot = loader().load(&source).expect("load");
    assert_eq!(snapshot.codes(), vec![101, 102, 103, 104]);
    assert_eq!(snapshot.records()[0].age().to_string(), "24 years old");
}
