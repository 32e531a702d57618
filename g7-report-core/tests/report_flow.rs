// End-to-end report cycles: reference load, upload, ΔE, logging, reload
use g7_report_core::{
    parse_measurements, ColumnValues, FsLogSink, ReferenceSet, ReportEngine, ReportError,
    ReportLogger,
};
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

const REFERENCE: &str = "Patch,L,a,b\nP1,50,0,0\nP2,95,1,-4\nP3,16,0,0\n";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn load_reference() -> ReferenceSet {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(REFERENCE.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    ReferenceSet::load(temp_file.path()).unwrap()
}

#[test]
fn test_upload_compute_log_and_reload() {
    init_logging();
    let reference = load_reference();
    let engine = ReportEngine::new(&reference);

    let upload = b"Patch,L,a,b,Operator\nP1,53,4,0,ann\nP2,95,1,-4,ann\nP3,17,0,0,ann\n";
    let measurement = parse_measurements(upload).unwrap();
    let result = engine.compute(measurement.clone()).unwrap();

    let delta: Vec<f64> = result.deviations().iter().map(|d| d.delta_e).collect();
    assert_eq!(delta, vec![5.0, 0.0, 1.0]);
    assert_eq!(result.max_delta_e(), 5.0);
    assert_eq!(result.mean_delta_e(), 2.0);
    assert!(result.pass());

    let dir = tempdir().unwrap();
    let logger = ReportLogger::new(FsLogSink::new(dir.path().join("logs")));
    let key = logger.log_report(&result, "PrinterX", "Week1").unwrap();
    assert_eq!(key, "PrinterX_Week1");
    assert!(dir.path().join("logs").join("PrinterX_Week1.csv").exists());

    let logged = logger.load_log("PrinterX", "Week1").unwrap();
    assert_eq!(
        logged.column_names(),
        vec!["Patch", "L", "a", "b", "Operator", "DeltaE", "Printer", "Week"]
    );
    for original in measurement.columns() {
        assert_eq!(logged.column(&original.name), Some(original));
    }
    assert_eq!(logged.numeric("DeltaE").unwrap(), &[5.0, 0.0, 1.0]);
    assert_eq!(
        logged.column("Printer").unwrap().values,
        ColumnValues::Text(vec!["PrinterX".to_string(); 3])
    );
    assert_eq!(
        logged.column("Week").unwrap().values,
        ColumnValues::Text(vec!["Week1".to_string(); 3])
    );
}

#[test]
fn test_second_log_overwrites_first() {
    init_logging();
    let reference = load_reference();
    let engine = ReportEngine::new(&reference);
    let dir = tempdir().unwrap();
    let logger = ReportLogger::new(FsLogSink::new(dir.path()));

    let first = engine
        .compute(parse_measurements(b"Patch,L,a,b\nP1,60,0,0\nP2,95,1,-4\nP3,16,0,0\n").unwrap())
        .unwrap();
    assert!(!first.pass());
    logger.log_report(&first, "Mutoh 924 #3", "W12").unwrap();

    let second = engine
        .compute(parse_measurements(b"Patch,L,a,b\nP1,50,0,0\nP2,95,1,-4\nP3,16,0,0\n").unwrap())
        .unwrap();
    logger.log_report(&second, "Mutoh 924 #3", "W12").unwrap();

    let logged = logger.load_log("Mutoh 924 #3", "W12").unwrap();
    assert_eq!(logged.num_rows(), 3);
    assert_eq!(logged.numeric("DeltaE").unwrap(), &[0.0, 0.0, 0.0]);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_recovered_single_column_upload() {
    init_logging();
    let reference = ReferenceSet::from_csv("Patch,L,a,b\nP1,50,0,0\n").unwrap();

    let measurement = parse_measurements(b"\"Patch,L,a,b\"\n\"P1,53,4,0\"\n").unwrap();
    let result = ReportEngine::new(&reference).compute(measurement).unwrap();

    assert_eq!(result.deviations()[0].patch, "P1");
    assert_eq!(result.deviations()[0].delta_e, 5.0);
    assert!(result.pass());
}

#[test]
fn test_failed_cycle_produces_nothing_to_log() {
    init_logging();
    let reference = load_reference();
    let engine = ReportEngine::new(&reference);

    let result = engine.compute(parse_measurements(b"Patch,L,a\nP1,1,2\nP2,1,2\nP3,1,2\n").unwrap());
    assert!(matches!(result, Err(ReportError::MissingColumns { .. })));

    let result = engine.compute(parse_measurements(b"Patch,L,a,b\nP1,50,0,0\n").unwrap());
    assert!(matches!(
        result,
        Err(ReportError::RowCountMismatch { measured: 1, reference: 3 })
    ));
}
