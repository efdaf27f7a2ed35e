fn main() -> anyhow::Result<()> {
    fmivis_sim::entrypoint()
}
