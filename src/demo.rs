use crate::session::{Session, SessionError};
use clap::App;

pub const CLAUSES: [&[i32]; 2] = [&[1], &[1, 2]];
pub const QUERY: [i32; 2] = [1, 2];

/// The example takes no arguments.
pub fn app<'a, 'b>() -> App<'a, 'b> {
    App::new("example")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Solves a fixed two-clause formula and prints the model for variables 1 and 2")
}

/// Returns the model for [`QUERY`], or `None` if the formula is unsatisfiable.
pub fn run() -> Result<Option<Vec<i32>>, SessionError> {
    let mut s = Session::new();
    s.add(&CLAUSES)?;
    if s.solve(&[])? {
        Ok(Some(s.get_model(&QUERY)?))
    } else {
        Ok(None)
    }
}
