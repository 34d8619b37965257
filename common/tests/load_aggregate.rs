use std::fs;

use common::{
    aggregate::{AggregateError, Metric, ViewKind, aggregate},
    result::{ResultError, load_rows},
};

const HEADER: &str = "Group,Experiment,Problem Space,Samples,Iterations,Baseline,us/Iteration,Iterations/sec\n";

#[tokio::test]
async fn results_file_to_views() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("results.csv");
    fs::write(
        &file,
        format!(
            "{HEADER}dense,Map,2000000,5,1,1.000,10,0.5\nsparse,ArtMap,1000000,5,1,0.42,4,3.0\ndense,ArtMap,2000000,5,1,0.9,9,0.75\nsparse,Map,1000000,5,1,1.000,8,1.5\n"
        ),
    )
    .unwrap();

    let rows = load_rows(&file).await.unwrap();
    assert_eq!(rows.len(), 4);
    let results = aggregate(&rows).unwrap();

    for kind in ViewKind::ALL {
        let datasets = results
            .view(kind)
            .datasets()
            .iter()
            .map(|d| d.dataset.as_str())
            .collect::<Vec<_>>();
        assert_eq!(datasets, vec!["dense", "sparse"]);
    }

    let dense = results.view(ViewKind::Absolute).get("dense").unwrap();
    assert_eq!(dense.implementations().collect::<Vec<_>>(), vec!["Map", "ArtMap"]);
    let art = dense.get("ArtMap").unwrap();
    assert_eq!(art.points[0].elements, 2.0);
    assert_eq!(art.points[0].metric, Metric::Throughput(1.5));

    let sparse = results.view(ViewKind::Baseline).get("sparse").unwrap();
    assert_eq!(
        sparse.get("ArtMap").unwrap().points[0].metric,
        Metric::Verbatim("0.42".to_owned())
    );
}

#[tokio::test]
async fn malformed_row_stops_loading() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("results.csv");
    fs::write(&file, format!("{HEADER}sparse,Map,1000000,5,1,1,1,1.5\nsparse,ArtMap\n")).unwrap();

    match load_rows(&file).await {
        Err(ResultError::MalformedRow { line, fields }) => {
            assert_eq!(line, 3);
            assert_eq!(fields, 2);
        }
        other => panic!("expected malformed row, got {other:?}"),
    }
}

#[tokio::test]
async fn non_numeric_elements_fail_aggregation() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("results.csv");
    fs::write(&file, format!("{HEADER}sparse,Map,many,5,1,1,1,1.5\n")).unwrap();

    let rows = load_rows(&file).await.unwrap();
    assert!(matches!(
        aggregate(&rows),
        Err(AggregateError::InvalidElements { line: 2, .. })
    ));
}
