use std::io::Write;

use deployer::Toolchain;
use ethers::{types::Address, utils::to_checksum};

pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_FAILURE: u8 = 1;

pub(crate) fn success_line(address: Address) -> String {
    format!("Contract deployed to: {}", to_checksum(&address, None))
}

/// Deploy `contract_name` and report the outcome.
///
/// The deployed address goes to `stdout`, a failure with its causes to `stderr`.
/// Returns the process exit status.
pub(crate) async fn run<T, O, E>(
    toolchain: &T,
    contract_name: &str,
    stdout: &mut O,
    stderr: &mut E,
) -> u8
where
    T: Toolchain,
    O: Write,
    E: Write,
{
    let report = match deployer::deploy_contract(toolchain, contract_name).await {
        Ok(deployment) => writeln!(stdout, "{}", success_line(deployment.address))
            .map_err(eyre::Report::new),
        Err(e) => Err(eyre::Report::new(e)),
    };

    match report {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            // nothing is left to report a broken stderr to
            let _ = writeln!(stderr, "{e:?}");
            EXIT_FAILURE
        }
    }
}
