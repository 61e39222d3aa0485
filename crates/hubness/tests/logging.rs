//! The logger writes computation messages to a file under `./logs`.

use ftlog::LevelFilter;

mod common;

#[test]
fn configure_logger() -> Result<(), String> {
    let (guard, log_path) = hubness::utils::configure_logger("hubness-test", LevelFilter::Debug)?;
    assert!(log_path.ends_with("logs/hubness-test.log"));

    let mut nsf = common::six_point_finder()?;
    nsf.calculate_neighbor_sets(2)?;
    ftlog::info!("Six-point neighbor sets: {:?}", nsf.neighbor_sets());

    drop(guard);
    assert!(log_path.parent().is_some_and(std::path::Path::exists));
    Ok(())
}
