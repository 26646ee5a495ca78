// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{value_parser, Arg, ArgAction, Command};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .help("Print as a JSON array")
            .action(ArgAction::SetTrue),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .help("Print as JSON lines")
            .action(ArgAction::SetTrue),
    )
}

fn required(name: &'static str) -> Arg {
    Arg::new(name).long(name).required(true)
}

fn optional(name: &'static str) -> Arg {
    Arg::new(name).long(name)
}

pub fn build_cli() -> Command {
    Command::new("centime")
        .about("Personal finance ledger: accounts, subscriptions, credits, savings projects")
        .version(clap::crate_version!())
        .subcommand(Command::new("init").about("Create or migrate the database"))
        .subcommand(
            Command::new("account")
                .about("Manage accounts")
                .subcommand(
                    Command::new("add")
                        .about("Add an account")
                        .arg(Arg::new("name").required(true))
                        .arg(required("type").help("bank|cash|card|savings"))
                        .arg(required("currency"))
                        .arg(optional("balance").help("Opening balance, default 0"))
                        .arg(
                            Arg::new("default")
                                .long("default")
                                .help("Make this the default account")
                                .action(ArgAction::SetTrue),
                        ),
                )
                .subcommand(json_flags(Command::new("list").about("List accounts")))
                .subcommand(
                    Command::new("rm")
                        .about("Remove an account")
                        .arg(Arg::new("name").required(true)),
                )
                .subcommand(
                    Command::new("transfer")
                        .about("Move money between two accounts")
                        .arg(required("from"))
                        .arg(required("to"))
                        .arg(required("amount"))
                        .arg(optional("description"))
                        .arg(optional("date").help("YYYY-MM-DD, default today")),
                ),
        )
        .subcommand(
            Command::new("category")
                .about("Manage categories")
                .subcommand(
                    Command::new("add")
                        .about("Add a category")
                        .arg(Arg::new("name").required(true))
                        .arg(optional("kind").help("income|expense, default expense")),
                )
                .subcommand(Command::new("list").about("List categories"))
                .subcommand(
                    Command::new("rm")
                        .about("Remove a category")
                        .arg(Arg::new("name").required(true)),
                ),
        )
        .subcommand(
            Command::new("tx")
                .about("Record and list transactions")
                .subcommand(
                    Command::new("add")
                        .about("Record a transaction")
                        .arg(required("account"))
                        .arg(required("amount"))
                        .arg(required("type").help("income|expense"))
                        .arg(optional("date").help("YYYY-MM-DD, default today"))
                        .arg(optional("description"))
                        .arg(optional("category"))
                        .arg(
                            Arg::new("tag")
                                .long("tag")
                                .action(ArgAction::Append)
                                .help("Attach a tag; repeatable"),
                        )
                        .arg(
                            optional("every")
                                .help("Make this a recurring template: daily|weekly|biweekly|monthly|quarterly|yearly"),
                        )
                        .arg(optional("until").help("Stop recurring after this date")),
                )
                .subcommand(
                    json_flags(
                        Command::new("list")
                            .about("List transactions")
                            .arg(optional("month").help("YYYY-MM"))
                            .arg(optional("account"))
                            .arg(optional("category"))
                            .arg(optional("type"))
                            .arg(
                                Arg::new("limit")
                                    .long("limit")
                                    .value_parser(value_parser!(usize)),
                            ),
                    ),
                ),
        )
        .subcommand(
            Command::new("subscription")
                .about("Manage recurring subscriptions")
                .subcommand(
                    Command::new("add")
                        .about("Add a subscription")
                        .arg(Arg::new("name").required(true))
                        .arg(required("amount"))
                        .arg(required("account"))
                        .arg(required("day").help("Day of month the charge falls on (1-31)"))
                        .arg(optional("frequency").help("Default monthly"))
                        .arg(optional("category")),
                )
                .subcommand(json_flags(Command::new("list").about("List subscriptions")))
                .subcommand(
                    Command::new("upcoming")
                        .about("Subscriptions due soon")
                        .arg(optional("days").help("Horizon in days, default 30")),
                )
                .subcommand(
                    Command::new("cancel")
                        .about("Deactivate a subscription")
                        .arg(Arg::new("name").required(true)),
                ),
        )
        .subcommand(
            Command::new("credit")
                .about("Manage installment credits")
                .subcommand(
                    Command::new("add")
                        .about("Add a credit and generate its payment schedule")
                        .arg(Arg::new("name").required(true))
                        .arg(required("total").help("Original principal"))
                        .arg(required("monthly").help("Fixed monthly installment"))
                        .arg(required("rate").help("Annual interest rate in percent"))
                        .arg(required("start"))
                        .arg(required("end"))
                        .arg(required("account"))
                        .arg(optional("day").help("Payment day of month, default 1"))
                        .arg(optional("remaining").help("Outstanding principal, if known")),
                )
                .subcommand(json_flags(Command::new("list").about("List credits")))
                .subcommand(
                    Command::new("schedule")
                        .about("Show a credit's payment schedule")
                        .arg(Arg::new("name").required(true)),
                )
                .subcommand(
                    Command::new("record-payment")
                        .about("Settle the next unpaid installment by hand")
                        .arg(Arg::new("name").required(true))
                        .arg(optional("date")),
                ),
        )
        .subcommand(
            Command::new("project")
                .about("Manage savings projects")
                .subcommand(
                    Command::new("add")
                        .about("Add a savings project")
                        .arg(Arg::new("name").required(true))
                        .arg(required("target"))
                        .arg(optional("deadline"))
                        .arg(optional("account")),
                )
                .subcommand(json_flags(Command::new("list").about("List projects")))
                .subcommand(
                    Command::new("contribute")
                        .about("Fund a project from an account")
                        .arg(required("project"))
                        .arg(required("account"))
                        .arg(required("amount"))
                        .arg(optional("notes")),
                ),
        )
        .subcommand(
            Command::new("process-due")
                .about("Settle everything due: subscriptions, credit installments, recurring transactions")
                .arg(optional("now").help("Pretend it is this date; default the current time"))
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the summary as JSON")
                        .action(ArgAction::SetTrue),
                ),
        )
}
