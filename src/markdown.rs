use askama::Template;

use crate::error::Result;
use crate::problem::Problem;

/// Joins rendered problems. The notebook builder splits on the same bytes.
pub const PROBLEM_SEPARATOR: &str = "\n<br>\n<hr style=\"border: 1px dashed #ccc;\">\n<br>\n\n";

#[derive(Debug, Template)]
#[template(path = "problem.md.j2", escape = "none")]
struct ProblemBlock<'a> {
    problem: &'a Problem,
}

pub fn render_problem(problem: &Problem) -> Result<String> {
    Ok(ProblemBlock { problem }.render()?)
}

pub fn assemble(problems: &[Problem]) -> Result<String> {
    let blocks = problems
        .iter()
        .map(render_problem)
        .collect::<Result<Vec<_>>>()?;
    Ok(blocks.join(PROBLEM_SEPARATOR))
}
