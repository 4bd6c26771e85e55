/// PySpark cell that reads the bucket's partitions back into a Databricks
/// notebook and charts the closing price for `ticker`.
pub fn databricks_snippet(ticker: &str, bucket_name: &str) -> String {
    format!(
        r#"# PySpark Code for Databricks Analysis

# 1. Configure GCS Access in your Databricks Cluster Spark config.
#    (See project README for details on setting up the service account)
#
#    spark.hadoop.google.cloud.auth.service.account.enable true
#    spark.hadoop.fs.gs.auth.service.account.json.keyfile /dbfs/path/to/key.json

# 2. Create a widget to select the ticker.
dbutils.widgets.text("ticker_symbol", "{ticker}", "Enter Ticker")

# 3. Read the data from GCS.
gcs_path = "gs://{bucket_name}/"
df = (spark.read
      .option("header", "true")
      .option("inferSchema", "true")
      .csv(gcs_path))
df.createOrReplaceTempView("stock_prices")

# 4. Run analysis. (Example: Display historical price)
display(spark.sql(f"""
    SELECT Date, Close
    FROM stock_prices
    WHERE Ticker = '{{dbutils.widgets.get("ticker_symbol")}}'
    ORDER BY Date
"""))
"#
    )
}
