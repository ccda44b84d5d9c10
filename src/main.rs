fn main() -> anyhow::Result<()> {
    paramflow::run()
}
