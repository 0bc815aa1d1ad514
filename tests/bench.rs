use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use assert_matches::assert_matches;

use graph_dataset_manager::bench::{BenchRunner, RunOptions, parse_output};
use graph_dataset_manager::domain::{Algorithm, GraphSpec};
use graph_dataset_manager::error::GdmError;
use graph_dataset_manager::process::{CommandOutput, CommandRunner};

const SAMPLE_OUTPUT: &str = "Loading graph\n\
Running BFS on source 4\n\
Total GPU Time: 12.50 ms\n\
Total Edge-Througput (MTEPS): 3.20 MTEPS\n";

struct ScriptedRunner {
    outputs: RefCell<VecDeque<CommandOutput>>,
    calls: RefCell<Vec<(PathBuf, Vec<String>, Option<PathBuf>)>>,
}

impl ScriptedRunner {
    fn new(outputs: Vec<CommandOutput>) -> Self {
        Self {
            outputs: RefCell::new(outputs.into()),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn args(&self) -> Vec<Vec<String>> {
        self.calls.borrow().iter().map(|(_, args, _)| args.clone()).collect()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(
        &self,
        program: &Path,
        args: &[String],
        cwd: Option<&Path>,
    ) -> Result<CommandOutput, GdmError> {
        self.calls.borrow_mut().push((
            program.to_path_buf(),
            args.to_vec(),
            cwd.map(Path::to_path_buf),
        ));
        Ok(self
            .outputs
            .borrow_mut()
            .pop_front()
            .expect("unexpected benchmark invocation"))
    }
}

fn ok(output: &str) -> CommandOutput {
    CommandOutput {
        status: Some(0),
        success: true,
        output: output.to_string(),
    }
}

fn run_text(source: u64, time: f64) -> String {
    format!("BFS on source {source}\nTotal GPU Time: {time} ms\nTotal Edge-Througput (MTEPS): 1.5 MTEPS\n")
}

fn options(dir: &Path, iterations: usize) -> RunOptions {
    let mut options = RunOptions::new(Algorithm::Bfs);
    options.directory = dir.to_path_buf();
    options.iterations = iterations;
    options
}

#[test]
fn parses_sample_output_exactly() {
    let row = parse_output("road", SAMPLE_OUTPUT);
    assert_eq!(row.graph, "road");
    assert_eq!(row.gpu_time_ms, Some(12.5));
    assert_eq!(row.edge_throughput, Some(3.2));
    assert_eq!(row.source, Some(4));
    assert!(row.success);
}

#[test]
fn missing_lines_leave_fields_empty() {
    let row = parse_output("road", "nothing useful\n  Total GPU Time: 3 ms\n");
    assert_eq!(row.gpu_time_ms, None);
    assert_eq!(row.edge_throughput, None);
    assert_eq!(row.source, None);
}

#[test]
fn observed_source_is_reused_across_iterations() {
    let temp = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new(vec![
        ok(&run_text(17, 10.0)),
        ok(&run_text(17, 11.0)),
        ok(&run_text(17, 12.0)),
    ]);
    let graph: GraphSpec = "road.mtx".parse().unwrap();

    let rows = BenchRunner::new(&runner, options(temp.path(), 3))
        .run(&[graph])
        .unwrap();

    assert_eq!(rows.len(), 3);
    assert_eq!(
        runner.args(),
        vec![
            vec!["road.mtx".to_string()],
            vec!["road.mtx".to_string(), "-s".to_string(), "17".to_string()],
            vec!["road.mtx".to_string(), "-s".to_string(), "17".to_string()],
        ]
    );

    let calls = runner.calls.borrow();
    let dir = std::fs::canonicalize(temp.path()).unwrap();
    assert_eq!(calls[0].0, dir.join("bfs"));
    assert_eq!(calls[0].2.as_deref(), Some(temp.path()));
}

#[test]
fn random_source_never_pins() {
    let temp = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new(vec![ok(&run_text(3, 1.0)), ok(&run_text(9, 2.0))]);
    let graph: GraphSpec = "web.bin".parse().unwrap();
    let mut options = options(temp.path(), 2);
    options.random_source = true;

    let rows = BenchRunner::new(&runner, options).run(&[graph]).unwrap();

    assert_eq!(rows[0].source, Some(3));
    assert_eq!(rows[1].source, Some(9));
    assert_eq!(
        runner.args(),
        vec![
            vec!["-b".to_string(), "web.bin".to_string()],
            vec!["-b".to_string(), "web.bin".to_string()],
        ]
    );
}

#[test]
fn graph_source_overrides_global_source() {
    let temp = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new(vec![ok(&run_text(5, 1.0)), ok(&run_text(8, 1.0))]);
    let graphs: Vec<GraphSpec> = vec!["a.mtx[5:u]".parse().unwrap(), "b.mtx".parse().unwrap()];
    let mut options = options(temp.path(), 1);
    options.source = Some(8);
    options.validate = true;

    BenchRunner::new(&runner, options).run(&graphs).unwrap();

    assert_eq!(
        runner.args(),
        vec![
            vec!["a.mtx", "-u", "-s", "5", "-v"],
            vec!["b.mtx", "-s", "8", "-v"],
        ]
        .into_iter()
        .map(|args| args.into_iter().map(str::to_string).collect::<Vec<_>>())
        .collect::<Vec<_>>()
    );
}

#[test]
fn non_zero_exit_aborts_with_output() {
    let temp = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new(vec![
        ok(&run_text(1, 1.0)),
        CommandOutput {
            status: Some(2),
            success: false,
            output: "CUDA error: out of memory\n".to_string(),
        },
    ]);
    let graphs: Vec<GraphSpec> = vec!["a.mtx".parse().unwrap(), "b.mtx".parse().unwrap()];

    let err = BenchRunner::new(&runner, options(temp.path(), 1))
        .run(&graphs)
        .unwrap_err();

    assert_matches!(
        err,
        GdmError::BenchmarkFailed { status: Some(2), ref output } if output.contains("out of memory")
    );
}

#[test]
fn missing_directory_fails_before_running() {
    let temp = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new(Vec::new());
    let graph: GraphSpec = "a.mtx".parse().unwrap();

    let err = BenchRunner::new(&runner, options(&temp.path().join("nope"), 1))
        .run(&[graph])
        .unwrap_err();

    assert_matches!(err, GdmError::Filesystem(_));
    assert!(runner.calls.borrow().is_empty());
}

#[test]
fn huge_iteration_count_fails_on_first_error() {
    let temp = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new(vec![CommandOutput {
        status: Some(1),
        success: false,
        output: "segfault\n".to_string(),
    }]);
    let graphs: Vec<GraphSpec> = vec![
        "a.mtx".parse().unwrap(),
        "b.mtx".parse().unwrap(),
        "c.mtx".parse().unwrap(),
    ];

    let err = BenchRunner::new(&runner, options(temp.path(), usize::MAX / 2))
        .run(&graphs)
        .unwrap_err();

    assert_matches!(err, GdmError::BenchmarkFailed { status: Some(1), .. });
    assert_eq!(runner.calls.borrow().len(), 1);
}
