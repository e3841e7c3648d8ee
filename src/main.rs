use clap::{App, Arg, ArgMatches};
use solbert::formula::dimacs::{parse, DimacsParseError};
use solbert::formula::Formula;
use solbert::*;
use std::fs::File;
use std::io::{self, Write};
use std::num::ParseIntError;

fn app<'a, 'b>() -> App<'a, 'b> {
    App::new("solbert")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Solves a DIMACS CNF formula, or enumerates prime implicants of a monotonic circuit")
        .arg(Arg::with_name("INPUT").help("input file (in CNF)").index(1))
        .arg(
            Arg::with_name("inputs")
                .long("inputs")
                .value_name("VARS")
                .help("comma separated input variables; enumerates prime implicants over them")
                .takes_value(true)
                .use_delimiter(false)
                .allow_hyphen_values(true),
        )
        .arg(
            Arg::with_name("root")
                .long("root")
                .value_name("VARS")
                .help("comma separated conjunction appended to the root disjunction")
                .takes_value(true)
                .use_delimiter(false)
                .allow_hyphen_values(true)
                .multiple(true)
                .number_of_values(1)
                .requires("inputs"),
        )
}

fn main() {
    env_logger::init();
    let matches = app().get_matches();

    let f = if let Some(path) = matches.value_of("INPUT") {
        parse_from_file(path)
    } else {
        parse(std::io::stdin())
    };

    match f {
        Ok(f) => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            let exit_code = if matches.is_present("inputs") {
                enumerate_prime_implicants(&f, &matches, &mut out)
            } else {
                solve(&f, &mut out)
            };
            match exit_code.and_then(|code| out.flush().map(|_| code)) {
                Ok(code) => std::process::exit(code),
                Err(e) => {
                    eprintln!("io error: {}", e);
                    std::process::exit(-1);
                }
            }
        }
        Err(e) => {
            eprintln!("parse error: {}", e);
            std::process::exit(-1);
        }
    }
}

fn parse_from_file(path: &str) -> Result<Formula, DimacsParseError> {
    let file = File::open(path)?;
    parse(file)
}

fn parse_vars(s: &str) -> Result<Vec<i32>, ParseIntError> {
    s.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::parse)
        .collect()
}

fn value_line(lits: &[i32]) -> String {
    let mut line = String::from("v");
    for lit in lits {
        line.push_str(&format!(" {}", lit));
    }
    line.push_str(" 0");
    line
}

fn solve<W: Write>(f: &Formula, out: &mut W) -> io::Result<i32> {
    writeln!(out, "c {}", Session::signature())?;
    writeln!(out, "c {} variables, {} clauses", f.num_variables(), f.num_clauses())?;

    let mut session = Session::new();
    session.add_formula(f);

    let satisfiable = session.solve(&[]).and_then(|sat| {
        if sat {
            session.full_model().map(Some)
        } else {
            Ok(None)
        }
    });
    match satisfiable {
        Ok(Some(model)) => {
            writeln!(out, "s SATISFIABLE")?;
            writeln!(out, "{}", value_line(&model))?;
            Ok(0)
        }
        Ok(None) => {
            writeln!(out, "s UNSATISFIABLE")?;
            Ok(1)
        }
        Err(e) => {
            eprintln!("solver error: {}", e);
            Ok(-1)
        }
    }
}

fn enumerate_prime_implicants<W: Write>(
    f: &Formula,
    matches: &ArgMatches,
    out: &mut W,
) -> io::Result<i32> {
    match prime_implicants(f, matches) {
        Ok(implicants) => {
            writeln!(out, "c {} prime implicants", implicants.len())?;
            for implicant in &implicants {
                writeln!(out, "{}", value_line(implicant))?;
            }
            Ok(0)
        }
        Err(e) => {
            eprintln!("error: {}", e);
            Ok(-1)
        }
    }
}

fn prime_implicants(
    f: &Formula,
    matches: &ArgMatches,
) -> Result<Vec<Vec<i32>>, Box<dyn std::error::Error>> {
    let inputs = parse_vars(matches.value_of("inputs").unwrap_or_default())?;
    let mut circuit = MonotonicCircuit::new(&f.to_dimacs(), &inputs)?;
    for root in matches.values_of("root").into_iter().flatten() {
        circuit.append_root(&parse_vars(root)?)?;
    }
    circuit.update_prime_implicants()?;
    Ok(circuit.prime_implicants().to_vec())
}
