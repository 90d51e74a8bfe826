use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::Context;

use crate::problem::vrptw::VRPTWInstance;
use crate::problem::Num;
use crate::solution::SolutionDescription;

/**
One line per route, listing every customer in visiting order together with its service start:

1 10 7 35.2 3 80
12 5 9 47.1

The depot is not written. The service start of a customer is `max(ready, arrival)` where the
arrival is the previous service start plus its service time plus the travel time.
 */
pub fn write_solution(
    path: impl Into<String>,
    desc: &SolutionDescription,
    instance: &VRPTWInstance,
) -> anyhow::Result<()> {
    let path: String = path.into();
    let f = File::create(&path).with_context(|| format!("cannot create solution file {}", path))?;
    let mut file = BufWriter::new(&f);
    write_routes(&mut file, desc, instance)?;
    file.flush()?;
    Ok(())
}

pub fn write_routes(
    mut writer: impl Write,
    desc: &SolutionDescription,
    instance: &VRPTWInstance,
) -> anyhow::Result<()> {
    for route in desc.routes() {
        let line = service_starts(instance, route)
            .into_iter()
            .map(|(c, t)| format!("{} {}", c, t))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(writer, "{}", line)?;
    }
    Ok(())
}

fn service_starts(instance: &VRPTWInstance, route: &[usize]) -> Vec<(usize, Num)> {
    let mut prev = instance.depot();
    let mut t = prev.ready;
    route
        .iter()
        .map(|&c| {
            let customer = instance.customer(c);
            t = (t + prev.servicetime + instance.time(prev.id, c)).max(customer.ready);
            prev = customer;
            (c, t)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::io::solomon_reader::read_instance;
    use crate::io::solomon_reader::tests::SMALL_INSTANCE;

    use super::*;

    #[test]
    fn writes_one_line_per_route_with_service_starts() -> anyhow::Result<()> {
        let instance = read_instance(SMALL_INSTANCE.as_bytes())?;
        let desc = SolutionDescription {
            routes: vec![vec![1, 2], vec![3]],
            ejection_pool: vec![],
            w: None,
        };

        let mut buffer = Vec::new();
        write_routes(&mut buffer, &desc, &instance)?;
        // 1 is reached at 5, 2 at 5 + 5 + 5 = 15; 3 at 5
        assert_eq!(String::from_utf8(buffer)?, "1 5 2 15\n3 5\n");
        Ok(())
    }

    #[test]
    fn service_starts_follow_the_route() -> anyhow::Result<()> {
        let instance = read_instance(SMALL_INSTANCE.as_bytes())?;
        let desc = SolutionDescription {
            routes: vec![vec![2, 1]],
            ejection_pool: vec![],
            w: None,
        };
        let starts = service_starts(&instance, &desc.routes()[0]);
        // 2 is reached at 10 and opens at 10, then 1 at 10 + 5 + 5
        assert_eq!(starts, vec![(2, 10.0), (1, 20.0)]);
        Ok(())
    }
}
