use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::domain::{Algorithm, GraphFormat, GraphSpec};
use crate::error::GdmError;
use crate::process::CommandRunner;
use crate::report::RunRow;

static GPU_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Total GPU Time: ([0-9]+(?:\.[0-9]+)?(?:[eE][+-]?[0-9]+)?) ms")
        .expect("gpu time pattern is valid")
});

static THROUGHPUT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Total Edge-Througput \(MTEPS\): ([0-9]+(?:\.[0-9]+)?(?:[eE][+-]?[0-9]+)?) MTEPS")
        .expect("throughput pattern is valid")
});

static SOURCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.* on source (\d+)").expect("source pattern is valid"));

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub algorithm: Algorithm,
    pub directory: PathBuf,
    pub iterations: usize,
    pub source: Option<u64>,
    pub random_source: bool,
    pub validate: bool,
}

impl RunOptions {
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            directory: PathBuf::from("."),
            iterations: 1,
            source: None,
            random_source: false,
            validate: false,
        }
    }
}

/// Command-line arguments for one invocation of the benchmark binary.
pub fn build_args(graph: &GraphSpec, source: Option<u64>, validate: bool) -> Vec<String> {
    let mut args = Vec::new();
    if graph.format == GraphFormat::Bin {
        args.push("-b".to_string());
    }
    args.push(graph.path.to_string_lossy().into_owned());
    if graph.format == GraphFormat::Mtx && graph.is_undirected() {
        args.push("-u".to_string());
    }
    if let Some(source) = source {
        args.push("-s".to_string());
        args.push(source.to_string());
    }
    if validate {
        args.push("-v".to_string());
    }
    args
}

/// Extracts timing, throughput and the source vertex from benchmark stdout.
/// Fields the binary did not print stay `None`.
pub fn parse_output(graph: &str, output: &str) -> RunRow {
    let mut row = RunRow {
        graph: graph.to_string(),
        source: None,
        success: true,
        gpu_time_ms: None,
        edge_throughput: None,
    };
    for line in output.lines() {
        if let Some(caps) = GPU_TIME_RE.captures(line) {
            row.gpu_time_ms = caps[1].parse().ok();
        } else if let Some(caps) = THROUGHPUT_RE.captures(line) {
            row.edge_throughput = caps[1].parse().ok();
        } else if let Some(caps) = SOURCE_RE.captures(line) {
            row.source = caps[1].parse().ok();
        }
    }
    row
}

pub struct BenchRunner<'a> {
    runner: &'a dyn CommandRunner,
    options: RunOptions,
}

impl<'a> BenchRunner<'a> {
    pub fn new(runner: &'a dyn CommandRunner, options: RunOptions) -> Self {
        Self { runner, options }
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Runs every graph in order; the first failing invocation aborts.
    pub fn run(&self, graphs: &[GraphSpec]) -> Result<Vec<RunRow>, GdmError> {
        let program = self.program()?;
        let mut rows = Vec::new();
        for graph in graphs {
            info!("Running on graph: {}", graph.path.display());
            rows.extend(self.run_graph(&program, graph)?);
        }
        Ok(rows)
    }

    fn program(&self) -> Result<PathBuf, GdmError> {
        let directory = fs::canonicalize(&self.options.directory).map_err(|err| {
            GdmError::Filesystem(format!("{}: {err}", self.options.directory.display()))
        })?;
        Ok(directory.join(self.options.algorithm.executable()))
    }

    fn run_graph(&self, program: &Path, graph: &GraphSpec) -> Result<Vec<RunRow>, GdmError> {
        let iterations = self.options.iterations;
        let mut source = graph.source.or(self.options.source);
        let mut rows = Vec::new();

        for it in 0..iterations {
            info!("Running iteration {}/{}", it + 1, iterations);
            let args = build_args(graph, source, self.options.validate);
            debug!(program = %program.display(), ?args, "invoking benchmark");
            let result = self
                .runner
                .run(program, &args, Some(&self.options.directory))?;
            if !result.success {
                return Err(GdmError::BenchmarkFailed {
                    status: result.status,
                    output: result.output,
                });
            }

            let row = parse_output(&graph.name, &result.output);
            if !self.options.random_source {
                match row.source {
                    Some(observed) => source = Some(observed),
                    None => warn!(graph = %graph.name, "benchmark output has no source vertex"),
                }
            }
            rows.push(row);
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_for_binary_graph_skip_orientation() {
        let graph: GraphSpec = "data/road.bin[3:u]".parse().unwrap();
        assert_eq!(
            build_args(&graph, graph.source, false),
            vec!["-b", "data/road.bin", "-s", "3"]
        );
    }

    #[test]
    fn args_for_undirected_mtx_with_validation() {
        let graph: GraphSpec = "road.mtx[u]".parse().unwrap();
        assert_eq!(build_args(&graph, None, true), vec!["road.mtx", "-u", "-v"]);
    }
}
