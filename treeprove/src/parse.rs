use crate::Error;
use log::info;
use std::path::Path;
use truthtree::parse::Problem;
use truthtree::Context;

/// Read a problem file, interning its sentences in `ctx`.
pub fn parse_file(ctx: &mut Context, filename: &Path) -> Result<Problem, Error> {
    info!("loading {}", filename.display());
    let input = std::fs::read_to_string(filename)?;
    let problem = truthtree::parse::parse(ctx, &input)?;
    for p in &problem.premises {
        info!("premise: {}", ctx.display(*p));
    }
    for g in &problem.goals {
        info!("goal: {}", ctx.display(*g));
    }
    Ok(problem)
}
