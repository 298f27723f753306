fn main() -> anyhow::Result<()> {
    let launch = warpdrive::run()?;
    println!("{}", launch.params.to_json()?);
    Ok(())
}
