use solbert::demo;

fn main() {
    env_logger::init();
    let _ = demo::app().get_matches();

    match demo::run() {
        Ok(Some(model)) => println!("{:?}", model),
        Ok(None) => {}
        Err(e) => {
            eprintln!("solver error: {}", e);
            std::process::exit(-1);
        }
    }
}
