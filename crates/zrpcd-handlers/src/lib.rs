//! Handler catalog for the z/OS resource operations (§6): dataset, USS,
//! job, and console commands. Each handler is a thin adapter around the
//! helper's CLI convention (argv in, stdout or CSV rows out); the
//! request-multiplexing runtime itself lives in `zrpcd-core`.

mod console;
mod dataset;
mod exec;
mod job;
pub mod types;
mod uss;

use zrpcd_core::{DaemonError, Dispatcher};
use zrpcd_core::protocol::methods;

/// Registers every method in the catalog against `dispatcher`. Called once
/// at startup; a duplicate registration is a programmer error and surfaces
/// as [`DaemonError::DuplicateRegistration`].
pub fn register_all(dispatcher: &mut Dispatcher) -> Result<(), DaemonError> {
    dispatcher.register(methods::LIST_DATASETS, dataset::list_datasets)?;
    dispatcher.register(methods::LIST_DS_MEMBERS, dataset::list_ds_members)?;
    dispatcher.register(methods::READ_DATASET, dataset::read_dataset)?;
    dispatcher.register(methods::WRITE_DATASET, dataset::write_dataset)?;
    dispatcher.register(methods::CREATE_DATASET, dataset::create_dataset)?;
    dispatcher.register(methods::CREATE_MEMBER, dataset::create_member)?;
    dispatcher.register(methods::DELETE_DATASET, dataset::delete_dataset)?;
    dispatcher.register(methods::RESTORE_DATASET, dataset::restore_dataset)?;

    dispatcher.register(methods::LIST_FILES, uss::list_files)?;
    dispatcher.register(methods::READ_FILE, uss::read_file)?;
    dispatcher.register(methods::WRITE_FILE, uss::write_file)?;
    dispatcher.register(methods::CREATE_FILE, uss::create_file)?;
    dispatcher.register(methods::DELETE_FILE, uss::delete_file)?;
    dispatcher.register(methods::CHOWN_FILE, uss::chown_file)?;
    dispatcher.register(methods::CHMOD_FILE, uss::chmod_file)?;
    dispatcher.register(methods::CHTAG_FILE, uss::chtag_file)?;

    dispatcher.register(methods::LIST_JOBS, job::list_jobs)?;
    dispatcher.register(methods::LIST_SPOOLS, job::list_spools)?;
    dispatcher.register(methods::READ_SPOOL, job::read_spool)?;
    dispatcher.register(methods::GET_JCL, job::get_jcl)?;
    dispatcher.register(methods::GET_JOB_STATUS, job::get_job_status)?;
    dispatcher.register(methods::SUBMIT_JOB, job::submit_job)?;
    dispatcher.register(methods::SUBMIT_JCL, job::submit_jcl)?;
    dispatcher.register(methods::SUBMIT_USS, job::submit_uss)?;
    dispatcher.register(methods::CANCEL_JOB, job::cancel_job)?;
    dispatcher.register(methods::DELETE_JOB, job::delete_job)?;
    dispatcher.register(methods::HOLD_JOB, job::hold_job)?;
    dispatcher.register(methods::RELEASE_JOB, job::release_job)?;

    dispatcher.register(methods::CONSOLE_COMMAND, console::console_command)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_all_populates_the_full_catalog() {
        let mut dispatcher = Dispatcher::new();
        register_all(&mut dispatcher).unwrap();
        for method in methods::ALL {
            assert!(dispatcher.contains(method), "missing handler for {method}");
        }
    }
}
