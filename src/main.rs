use anyhow::Result;

fn main() -> Result<()> {
    turn_navigator::cli::run()
}
