mod history_tests;
mod presence_tests;
mod upgrade_tests;
