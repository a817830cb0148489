use linsys::LinearSystem;
use std::io::{BufRead, BufReader};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let stdin = std::io::stdin();
    let mut lines = Vec::new();

    for line in BufReader::new(stdin.lock()).lines() {
        let line = line?;

        if !line.trim().is_empty() {
            lines.push(line);
        }
    }

    let system = LinearSystem::from_lines(&lines)?;

    let mut matrix = system.clone().into_matrix();
    println!("ORIGINAL");
    for row in matrix.rows() {
        println!("{:?}", row);
    }

    linsys::reduce(&mut matrix);
    println!("\nDECOMPOSED");
    for row in matrix.rows() {
        println!("{:?}", row);
    }

    let solution = system.solve()?;
    println!("\nSOLUTION");
    println!("{}", solution);

    Ok(())
}
