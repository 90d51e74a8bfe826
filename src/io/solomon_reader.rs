use std::fs::File;
use std::io::{BufRead, BufReader};

use anyhow::{bail, ensure, Context};

use crate::problem::vrptw::{create_instance_with, Customer, VRPTWInstance};
use crate::problem::Num;

/**
Solomon benchmark format (whitespace separated, blank lines are ignored):

C101
VEHICLE
NUMBER     CAPACITY
  25         200
CUSTOMER
CUST NO.  XCOORD.   YCOORD.    DEMAND   READY TIME  DUE DATE   SERVICE   TIME
    0      40         50          0          0       1236          0
    1      45         68         10        912        967         90
...

Customer 0 is the depot. The value of travel time is equal to the value of distance.
 */
pub(crate) fn load_instance(path: impl Into<String>) -> anyhow::Result<VRPTWInstance> {
    let path: String = path.into();
    let f = File::open(&path).with_context(|| format!("cannot open problem file {}", path))?;
    read_instance(BufReader::new(&f)).with_context(|| format!("malformed problem file {}", path))
}

pub(crate) fn read_instance(reader: impl BufRead) -> anyhow::Result<VRPTWInstance> {
    let mut lines = reader
        .lines()
        .filter(|it| it.as_ref().map_or(true, |line| !line.trim().is_empty()));

    let mut next_line = |what: &str| -> anyhow::Result<String> {
        match lines.next() {
            Some(line) => Ok(line?.trim().to_string()),
            None => bail!("unexpected end of file, expected {}", what),
        }
    };

    let name = next_line("instance name")?;
    expect_section(&next_line("VEHICLE")?, "VEHICLE")?;
    expect_section(&next_line("NUMBER CAPACITY")?, "NUMBER")?;
    let (num_vehicles, capacity) = read_properties(&next_line("vehicle properties")?)?;
    expect_section(&next_line("CUSTOMER")?, "CUSTOMER")?;
    // column header
    next_line("customer column header")?;

    let mut customers = Vec::new();
    for line in lines {
        customers.push(read_customer(line?.trim())?);
    }
    ensure!(!customers.is_empty(), "no customers found");
    ensure!(customers[0].id == 0, "the first customer must be the depot (id 0)");

    create_instance_with(name, num_vehicles, capacity, customers)
}

fn expect_section(line: &str, keyword: &str) -> anyhow::Result<()> {
    ensure!(
        line.split_whitespace().next() == Some(keyword),
        "expected '{}', found '{}'",
        keyword,
        line
    );
    Ok(())
}

fn read_properties(line: &str) -> anyhow::Result<(usize, Num)> {
    let mut split = line.split_whitespace();
    let num_vehicles = split
        .next()
        .context("missing number of vehicles")?
        .parse::<usize>()?;
    let capacity = split.next().context("missing capacity")?.parse::<Num>()?;
    Ok((num_vehicles, capacity))
}

fn read_customer(line: &str) -> anyhow::Result<Customer> {
    let fields = line
        .split_whitespace()
        .map(|it| it.parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("non-numeric customer line '{}'", line))?;
    ensure!(
        fields.len() == 7,
        "customer line '{}' has {} fields, expected 7",
        line,
        fields.len()
    );
    ensure!(
        fields[0] >= 0.0 && fields[0].fract() == 0.0,
        "invalid customer id in '{}'",
        line
    );
    // <id> <x> <y> <demand> <ready> <due> <service>
    Ok(Customer {
        id: fields[0] as usize,
        x: fields[1],
        y: fields[2],
        demand: fields[3],
        ready: fields[4],
        due: fields[5],
        servicetime: fields[6],
    })
}
