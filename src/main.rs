fn main() {
    dataset_iter::cli::run();
}
