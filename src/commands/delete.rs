//! Delete command handlers.

use crate::args::RemoveArgs;
use crate::commands::{open, save, Out};
use crate::model::Bill;
use crate::state::Command;
use crate::{Config, Result};

/// Removes the bill with the given id and saves the ledger. An unknown id changes nothing.
pub async fn remove(config: Config, args: RemoveArgs) -> Result<Out<Bill>> {
    let mut cashbook = open(&config).await?;
    let Some(bill) = cashbook
        .state()
        .bill()
        .iter()
        .find(|b| b.id() == args.id())
        .map(|b| Bill::clone(b))
    else {
        return Ok(format!("There is no bill with id '{}'", args.id()).into());
    };

    cashbook.dispatch(Command::Remove(bill.clone()));
    save(&config, &cashbook).await?;
    Ok(Out::new(format!("Removed bill '{}'", bill.id()), bill))
}
