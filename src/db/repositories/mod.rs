mod brew_logs;
