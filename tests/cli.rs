use assert_cmd::Command;
use predicates::prelude::*;

const MOVEMENTS: &str = "\
Date,Amount,Category,Income/Expensive
2024-01-05,1000,salary,income
2024-01-12,200,food,expense
2024-02-03,150,restaurant,expense
2024-02-04,75,gift,transfer
";

fn finanzas() -> Command {
    let mut cmd = Command::cargo_bin("finanzas").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn missing_input_fails_with_load_error() {
    let dir = tempfile::tempdir().unwrap();
    finanzas()
        .current_dir(dir.path())
        .args(["--input", "nowhere.xlsx"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error: Failed to load nowhere.xlsx"));
    assert!(!dir.path().join("reporte").exists());
}

#[test]
fn csv_input_produces_report() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("movements.csv"), MOVEMENTS).unwrap();
    finanzas()
        .current_dir(dir.path())
        .args(["--input", "movements.csv", "--no-overview"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Report written to"))
        .stdout(predicate::str::contains("unrecognized income/expense label"));

    let html = std::fs::read_to_string(dir.path().join("reporte/reporte.html")).unwrap();
    assert!(html.contains("<td>2024-02</td><td>$ 0.00</td><td>$ 150.00</td>"));
    assert!(html.contains("graficas/gastos_por_categoria.png"));
    assert!(!dir.path().join("reporte/graficas/histograma_amount.png").exists());
}

#[test]
fn settings_file_in_working_directory_is_used() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("datos.csv"), MOVEMENTS).unwrap();
    std::fs::write(
        dir.path().join("finanzas.json"),
        r#"{"input": "datos.csv", "output_dir": "salida", "overview_charts": false}"#,
    )
    .unwrap();
    finanzas().current_dir(dir.path()).assert().success();
    assert!(dir.path().join("salida/reporte.html").exists());
    assert!(dir.path().join("salida/graficas/ingresos_vs_egresos_por_mes.png").exists());
}

#[test]
fn explicit_config_must_exist() {
    let dir = tempfile::tempdir().unwrap();
    finanzas()
        .current_dir(dir.path())
        .args(["--config", "missing.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Settings error"));
}

#[cfg(feature = "xlsx")]
fn workbook() -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/movements.xlsx")
}

#[cfg(feature = "xlsx")]
#[test]
fn workbook_sheet_produces_report() {
    let dir = tempfile::tempdir().unwrap();
    finanzas()
        .current_dir(dir.path())
        .arg("--input")
        .arg(workbook())
        .args(["--sheet", "Movements"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Report written to"));

    let html = std::fs::read_to_string(dir.path().join("reporte/reporte.html")).unwrap();
    assert!(html.contains("<td>2024-01</td><td>$ 1,000.00</td><td>$ 200.00</td>"));
    assert!(html.contains("graficas/historico_restaurant_food.png"));
    assert!(dir.path().join("reporte/graficas/evolucion_temporal.png").exists());
}

#[cfg(feature = "xlsx")]
#[test]
fn unknown_sheet_fails_with_load_error() {
    let dir = tempfile::tempdir().unwrap();
    finanzas()
        .current_dir(dir.path())
        .arg("--input")
        .arg(workbook())
        .args(["--sheet", "Hoja1"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("worksheet 'Hoja1' not found"));
    assert!(!dir.path().join("reporte").exists());
}
