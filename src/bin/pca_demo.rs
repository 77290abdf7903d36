use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use stepwise_pca::display::{render_run, render_vector};
use stepwise_pca::{PcaConfig, PCA};

/// The 10x2 teaching dataset used when no input file is given.
const DEMO_DATA: [[f64; 2]; 10] = [
    [2.5, 2.4],
    [0.5, 0.7],
    [2.2, 2.9],
    [1.9, 2.2],
    [3.1, 3.0],
    [2.3, 2.7],
    [2.0, 1.6],
    [1.0, 1.1],
    [1.5, 1.6],
    [1.1, 0.9],
];

/// Principal component analysis, step by step
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// CSV file with one observation per line and no header ("-" for stdin).
    /// Defaults to a built-in 10x2 dataset.
    #[arg(short, long)]
    input: Option<PathBuf>,
    /// CSV delimiter
    #[arg(long, default_value_t = String::from(","))]
    csv_delim: String,
    /// JSON file with PCA configuration
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Override the eigenvalue threshold for keeping a component
    #[arg(short, long)]
    threshold: Option<f64>,
    /// Compute the covariance matrix in parallel
    #[arg(long)]
    parallel: bool,
    /// Print every intermediate matrix, not only the result
    #[arg(short, long)]
    display: bool,
    /// Decimal places when printing
    #[arg(long, default_value_t = 6)]
    precision: usize,
}

fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}

fn parse_rows<R: BufRead>(reader: R, delim: &str) -> Result<Vec<Vec<f64>>> {
    let mut rows = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("read line {}", line_no + 1))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let row = line
            .split(delim)
            .map(|field| {
                let field = field.trim();
                field
                    .parse::<f64>()
                    .with_context(|| format!("line {}: invalid number {:?}", line_no + 1, field))
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }
    Ok(rows)
}

fn load_rows(cli: &Cli) -> Result<Vec<Vec<f64>>> {
    match &cli.input {
        None => Ok(DEMO_DATA.iter().map(|r| r.to_vec()).collect()),
        Some(path) if path.as_os_str() == "-" => parse_rows(io::stdin().lock(), &cli.csv_delim),
        Some(path) => {
            let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
            parse_rows(BufReader::new(file), &cli.csv_delim)
        }
    }
}

fn load_config(cli: &Cli) -> Result<PcaConfig> {
    let mut config = match &cli.config {
        Some(path) => PcaConfig::from_json_file(path)?,
        None => PcaConfig::default(),
    };
    if let Some(threshold) = cli.threshold {
        config.eigenvalue_threshold = threshold;
    }
    if cli.parallel {
        config.parallel_covariance = true;
    }
    Ok(config)
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let rows = load_rows(&cli)?;
    let config = load_config(&cli)?;
    info!("Loaded {} observations", rows.len());

    let pca = PCA::with_config(config)?;
    info!("Eigen-solver backend: {}", pca.backend().backend_name());
    let run = pca.fit_rows(&rows).context("PCA failed")?;

    if cli.display {
        print!("{}", render_run(&run, cli.precision));
        println!(
            "\n* Explained variance ratio :\n{}",
            render_vector(run.explained_variance_ratio().view(), cli.precision)
        );
    } else {
        for row in run.projected.rows() {
            println!("{}", render_vector(row, cli.precision));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_csv_rows_skipping_blanks_and_comments() {
        let text = "# x,y\n1.5, 2\n\n-3,4e-1\n";
        let rows = parse_rows(text.as_bytes(), ",").unwrap();
        assert_eq!(rows, vec![vec![1.5, 2.0], vec![-3.0, 0.4]]);
    }

    #[test]
    fn reports_bad_numbers_with_line() {
        let err = parse_rows("1,2\n3,abc\n".as_bytes(), ",").unwrap_err();
        assert!(err.to_string().contains("line 2"), "{err}");
    }

    #[test]
    fn cli_overrides_config() {
        let cli = Cli::parse_from(["pca_demo", "--threshold", "0.01", "--parallel"]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.eigenvalue_threshold, 0.01);
        assert!(config.parallel_covariance);
        assert_eq!(load_rows(&cli).unwrap().len(), 10);
    }
}
