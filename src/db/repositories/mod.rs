mod interviews;
mod reports;
