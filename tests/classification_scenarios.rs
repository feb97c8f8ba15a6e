// End-to-end scenarios through the public library API
//
// Each test loads a campaign the way the binary does (JSON dump + config) and
// checks the numbers a reliability report would quote.

use seuscope::aggregate::{
    error_rate_by_type, error_rate_by_type_in_children, stacked_register_error_class,
    windowed_rate_for,
};
use seuscope::campaign::Campaign;
use seuscope::classifier::classify;
use seuscope::config::AnalysisConfig;
use seuscope::error::AnalysisError;
use seuscope::outcome::OutcomeClass;
use seuscope::probability::{adjusted_probability, expected_collisions};
use seuscope::record::{GoldenRecord, RunRecord};

fn fixture() -> Campaign {
    let config = AnalysisConfig::from_toml("tests/fixtures/analysis.toml").unwrap();
    Campaign::from_json_file("tests/fixtures/campaign.json", config).unwrap()
}

#[test]
fn test_golden_comparison_scenario() {
    let golden = GoldenRecord::new().with_field("a", 1).with_field("b", 2);
    let runs = vec![
        RunRecord::new("R1").with_field("a", 1).with_field("b", 2),
        RunRecord::new("R2").with_field("a", 1).with_null("b"),
        RunRecord::new("R3").with_field("a", 5).with_field("b", 2),
    ];

    let labels = classify(&runs, &golden, &["a", "b"], &["a", "b"]);
    let mapping: Vec<(&str, OutcomeClass)> = labels.iter().collect();
    assert_eq!(
        mapping,
        vec![
            ("R1", OutcomeClass::Silent),
            ("R2", OutcomeClass::Critical),
            ("R3", OutcomeClass::Corruption),
        ]
    );
}

#[test]
fn test_adjusted_probability_scenario() {
    let golden = GoldenRecord::new().with_field("crc", 1);
    let runs: Vec<RunRecord> = (0..10)
        .map(|i| {
            let run = RunRecord::new(format!("r{}", i));
            match i {
                0..=2 => run.with_field("crc", 1),
                3..=6 => run.with_field("crc", 2),
                _ => run.with_null("crc"),
            }
        })
        .collect();
    let labels = classify(&runs, &golden, &["crc"], &["crc"]);

    let adjusted = adjusted_probability(&labels, 1000.0, 10).unwrap();
    assert!((adjusted.rates.silent - 300.0).abs() < 1e-9);
    assert!((adjusted.rates.corruption - 400.0).abs() < 1e-9);
    assert!((adjusted.rates.critical - 300.0).abs() < 1e-9);
}

#[test]
fn test_collision_scenario() {
    let eps: f64 = 1.0 / 1000.0;
    let direct: f64 = 1000.0
        * (2..=5u32)
            .map(|k| {
                let choose = (0..k).fold(1.0, |acc, i| acc * (5 - i) as f64 / (i + 1) as f64);
                k as f64 * choose * eps.powi(k as i32) * (1.0 - eps).powi(5 - k as i32)
            })
            .sum::<f64>();

    let expected = expected_collisions(100, 10, 5).unwrap();
    assert!((expected - direct).abs() < 1e-9);
}

#[test]
fn test_fixture_root_rates() {
    let campaign = fixture();
    let rates = error_rate_by_type(&campaign, campaign.root()).unwrap();

    assert!((rates.silent - 16.0 / 24.0).abs() < 1e-12);
    assert!((rates.corruption - 5.0 / 24.0).abs() < 1e-12);
    assert!((rates.critical - 3.0 / 24.0).abs() < 1e-12);

    // the stalled run has no target register but is still classified
    assert_eq!(campaign.classify_all().get("seu_stall"), Some(OutcomeClass::Critical));
}

#[test]
fn test_fixture_children_and_registers() {
    let campaign = fixture();
    let names: Vec<String> = error_rate_by_type_in_children(&campaign, campaign.root())
        .into_iter()
        .map(|row| row.name)
        .collect();
    assert_eq!(names, vec!["csr", "regfile", "pc"]);

    let csr = campaign.resolve("core.csr").unwrap();
    let rows = stacked_register_error_class(&campaign, csr, "register");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].register, "core.csr.mstatus");
    assert_eq!(rows[0].proportions.critical, 0.5);
    assert_eq!(rows[0].proportions.corruption, 0.0);
}

#[test]
fn test_fixture_windowed_rate() {
    let campaign = fixture();
    let points = windowed_rate_for(&campaign, campaign.root()).unwrap();

    assert_eq!(points.len(), 24);
    assert_eq!(points.iter().filter(|p| p.estimate.is_some()).count(), 16);
    assert!(points[..4].iter().all(|p| p.estimate.is_none()));
    assert!(points[20..].iter().all(|p| p.estimate.is_none()));

    // too few runs under a single register for a window of 8
    let x1 = campaign.resolve("core.regfile.x1").unwrap();
    assert!(matches!(
        windowed_rate_for(&campaign, x1),
        Err(AnalysisError::InsufficientData { .. })
    ));
}
